//! JSON request/response envelope for `sudo-context command`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use sudo_context_protocol::ErrorEnvelope;
use sudo_context_store::{ContextError, Operation, RepoInspector};

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub action: String,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl CommandResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            error: None,
            data,
        }
    }

    pub fn error(error: ErrorEnvelope) -> Self {
        Self {
            status: CommandStatus::Error,
            error: Some(error),
            data: Value::Null,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }
}

/// Run a JSON request. A payload without `project_root` is pointed at `default_root`.
pub fn execute(
    request: CommandRequest,
    default_root: &Path,
    inspector: &dyn RepoInspector,
) -> CommandResponse {
    let CommandRequest {
        action,
        mut payload,
    } = request;
    if let Value::Object(map) = &mut payload {
        map.entry("project_root")
            .or_insert_with(|| Value::String(default_root.to_string_lossy().to_string()));
    }
    log::debug!("command action={action}");
    run(Operation::parse(&action, &payload), inspector)
}

/// Execute an already-validated operation and wrap the outcome.
pub fn run(op: Result<Operation, ContextError>, inspector: &dyn RepoInspector) -> CommandResponse {
    let outcome = op.and_then(|op| op.execute(inspector));
    match outcome {
        Ok(output) => match serde_json::to_value(&output) {
            Ok(data) => CommandResponse::ok(data),
            Err(err) => CommandResponse::error(ErrorEnvelope {
                code: "internal".to_string(),
                message: format!("failed to serialize result ({err})"),
                details: None,
                hint: None,
            }),
        },
        Err(err) => {
            if err.is_caller_error() {
                log::debug!("request rejected: {err}");
            } else {
                log::error!("{err}");
            }
            CommandResponse::error(err.envelope())
        }
    }
}
