pub(in crate::tools::dispatch) mod check_context_status;
pub(in crate::tools::dispatch) mod error;
pub(in crate::tools::dispatch) mod query_context;
pub(in crate::tools::dispatch) mod upsert_context;
