use super::super::{CallToolResult, SudoContextService};
use super::error::{context_error, json_result};
use sudo_context_protocol::UpsertContextArgs;
use sudo_context_store::UpsertContext;

/// Merge-write one directory's context.
pub(in crate::tools::dispatch) async fn upsert_context(
    service: &SudoContextService,
    request: UpsertContextArgs,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let op = match UpsertContext::try_from(request) {
        Ok(op) => op,
        Err(err) => return Ok(context_error(&err)),
    };

    let outcome = match service
        .run_exclusive("upsert_context", move |_| op.execute())
        .await
    {
        Ok(outcome) => outcome,
        Err(result) => return Ok(result),
    };
    Ok(json_result("upsert_context", &outcome))
}
