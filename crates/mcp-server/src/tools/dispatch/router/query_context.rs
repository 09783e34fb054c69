use super::super::{CallToolResult, SudoContextService};
use super::error::{context_error, json_result};
use sudo_context_protocol::QueryContextArgs;
use sudo_context_store::QueryContext;

/// Read one directory's context, optionally restricted to named sections.
pub(in crate::tools::dispatch) async fn query_context(
    service: &SudoContextService,
    request: QueryContextArgs,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let op = match QueryContext::try_from(request) {
        Ok(op) => op,
        Err(err) => return Ok(context_error(&err)),
    };

    match service
        .run_exclusive("query_context", move |_| op.execute())
        .await
    {
        Ok(doc) => Ok(json_result("query_context", &doc)),
        Err(result) => Ok(result),
    }
}
