use serde_json::json;
use std::path::PathBuf;
use sudo_context_protocol::ErrorEnvelope;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContextError>;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Parameter '{field}' must be {expected}")]
    InvalidParameterType {
        field: String,
        expected: &'static str,
    },

    #[error("Invalid directory '{key}': {reason}")]
    InvalidDirectory { key: String, reason: &'static str },

    #[error("No context found for directory: {0}")]
    NotFound(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{command} failed: {message}")]
    Environment { command: String, message: String },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt context document {}: {source}", path.display())]
    CorruptDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ContextError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code reported alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_)
            | Self::InvalidParameterType { .. }
            | Self::InvalidDirectory { .. } => "validation",
            Self::NotFound(_) => "not_found",
            Self::UnknownOperation(_) => "unknown_operation",
            Self::Environment { .. } => "environment",
            Self::Io { .. } => "io",
            Self::CorruptDocument { .. } => "corrupt_document",
        }
    }

    /// Validation, lookup, and dispatch errors are the caller's to fix; the rest
    /// point at the store or the machine it runs on.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.code(),
            "validation" | "not_found" | "unknown_operation"
        )
    }

    /// Wire form shared by every front end.
    pub fn envelope(&self) -> ErrorEnvelope {
        let details = match self {
            Self::Io { path, .. } | Self::CorruptDocument { path, .. } => {
                Some(json!({ "path": path.to_string_lossy() }))
            }
            Self::Environment { command, .. } => Some(json!({ "command": command })),
            _ => None,
        };
        ErrorEnvelope {
            code: self.code().to_string(),
            message: self.to_string(),
            details,
            hint: self.hint().map(str::to_string),
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound(_) => Some(
                "Use upsert_context to create it, or check_context_status to list directories without context.",
            ),
            Self::InvalidDirectory { .. } => Some(
                "Pass a path relative to project_root, e.g. \"src/tools\", or \".\" for the root.",
            ),
            Self::CorruptDocument { .. } => {
                Some("The stored file is not valid JSON; fix or remove it before retrying.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_envelope_carries_code_and_hint() {
        let envelope = ContextError::NotFound("src".to_string()).envelope();
        assert_eq!(envelope.code, "not_found");
        assert_eq!(envelope.message, "No context found for directory: src");
        assert!(envelope.hint.is_some());
        assert!(envelope.details.is_none());
    }

    #[test]
    fn environment_envelope_names_the_command() {
        let err = ContextError::Environment {
            command: "git ls-files -z".to_string(),
            message: "not a git repository".to_string(),
        };
        assert!(!err.is_caller_error());
        let envelope = err.envelope();
        assert_eq!(envelope.code, "environment");
        assert_eq!(envelope.details, Some(json!({ "command": "git ls-files -z" })));
        assert!(envelope.hint.is_none());
    }
}
