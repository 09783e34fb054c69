use super::super::{CallToolResult, Content};
use serde::Serialize;
use serde_json::json;
use sudo_context_protocol::{serialize_json_pretty, ErrorEnvelope};
use sudo_context_store::ContextError;

pub(in crate::tools::dispatch) fn tool_error_envelope(error: ErrorEnvelope) -> CallToolResult {
    let mut text = error.message.clone();
    if let Some(hint) = error.hint.as_deref().filter(|h| !h.trim().is_empty()) {
        text.push_str("\nhint: ");
        text.push_str(hint);
    }
    let mut result = CallToolResult::error(vec![Content::text(text)]);
    result.structured_content = Some(json!({ "error": error }));
    result
}

pub(in crate::tools::dispatch) fn tool_error(
    code: &'static str,
    message: impl Into<String>,
) -> CallToolResult {
    tool_error_envelope(ErrorEnvelope {
        code: code.to_string(),
        message: message.into(),
        details: None,
        hint: None,
    })
}

pub(in crate::tools::dispatch) fn internal_error(message: impl Into<String>) -> CallToolResult {
    tool_error("internal", message)
}

pub(in crate::tools::dispatch) fn context_error(err: &ContextError) -> CallToolResult {
    tool_error_envelope(err.envelope())
}

/// Success result: pretty JSON text plus the same payload as structured content.
pub(in crate::tools::dispatch) fn json_result<T: Serialize>(
    tool: &'static str,
    payload: &T,
) -> CallToolResult {
    let text = match serialize_json_pretty(payload) {
        Ok(text) => text,
        Err(err) => {
            return internal_error(format!("failed to serialize {tool} result ({err})"));
        }
    };
    let mut result = CallToolResult::success(vec![Content::text(text)]);
    match serde_json::to_value(payload) {
        Ok(value) => {
            result.structured_content = Some(value);
            result
        }
        Err(err) => internal_error(format!(
            "failed to serialize {tool} structured_content ({err})"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_code_and_hint() {
        let result = context_error(&ContextError::NotFound("src".to_string()));
        assert_eq!(result.is_error, Some(true));
        let structured = result.structured_content.expect("structured content");
        assert_eq!(structured["error"]["code"], "not_found");
        assert_eq!(
            structured["error"]["message"],
            "No context found for directory: src"
        );
        assert!(structured["error"]["hint"].is_string());
    }

    #[test]
    fn validation_errors_have_no_hint() {
        let result = context_error(&ContextError::MissingParameter("repo".to_string()));
        let structured = result.structured_content.expect("structured content");
        assert_eq!(structured["error"]["code"], "validation");
        assert_eq!(
            structured["error"]["message"],
            "Missing required parameter: repo"
        );
        assert!(structured["error"]["hint"].is_null());
    }
}
