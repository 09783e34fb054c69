use super::super::{CallToolResult, SudoContextService};
use super::error::{context_error, json_result};
use sudo_context_protocol::CheckContextStatusArgs;
use sudo_context_store::CheckContextStatus;

/// Audit stored contexts against the repository's tracked directories.
pub(in crate::tools::dispatch) async fn check_context_status(
    service: &SudoContextService,
    request: CheckContextStatusArgs,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let op = match CheckContextStatus::try_from(request) {
        Ok(op) => op,
        Err(err) => return Ok(context_error(&err)),
    };

    match service
        .run_exclusive("check_context_status", move |inspector| op.execute(inspector))
        .await
    {
        Ok(report) => Ok(json_result("check_context_status", &report)),
        Err(result) => Ok(result),
    }
}
