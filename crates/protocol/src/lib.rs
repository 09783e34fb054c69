//! Wire types shared by the sudo-context store, MCP server, and CLI.
//!
//! Everything here is plain data: the persisted context document schema, the
//! argument and result shapes of the three operations, and the error envelope
//! every surface reports failures with.

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SERVER_NAME: &str = "sudo-context";

/// Section name to section content. Ordered so persisted documents are stable.
pub type Sections = BTreeMap<String, String>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperationName {
    UpsertContext,
    QueryContext,
    CheckContextStatus,
}

impl OperationName {
    pub const ALL: [OperationName; 3] = [
        OperationName::UpsertContext,
        OperationName::QueryContext,
        OperationName::CheckContextStatus,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            OperationName::UpsertContext => "upsert_context",
            OperationName::QueryContext => "query_context",
            OperationName::CheckContextStatus => "check_context_status",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

/// Persisted knowledge for one directory of a project.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct ContextDocument {
    /// Repo namespace/name (e.g. owner/repo)
    pub repo: String,
    /// Directory key ("." for the project root)
    pub directory: String,
    /// Revision the document was last believed accurate against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// ISO-8601 UTC timestamp of the last write
    pub updated_at: String,
    pub sections: Sections,
}

impl ContextDocument {
    /// The recorded revision, if there is a usable one.
    pub fn baseline_ref(&self) -> Option<&str> {
        self.git_ref
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Keep only the named sections. Names without a stored section are ignored.
    pub fn retain_sections(&mut self, names: &[String]) {
        self.sections
            .retain(|key, _| names.iter().any(|name| name == key));
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct UpsertContextArgs {
    #[schemars(description = "Absolute path to git repo root")]
    pub project_root: Option<String>,

    #[schemars(description = "Repo namespace/name (e.g. owner/repo)")]
    pub repo: Option<String>,

    #[schemars(description = "Current short git ref")]
    pub git_ref: Option<String>,

    #[schemars(description = "Relative dir path (\".\" for root)")]
    pub directory: Option<String>,

    #[schemars(description = "Section name to content string pairs")]
    pub sections: Option<Sections>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct QueryContextArgs {
    #[schemars(description = "Absolute path to git repo root")]
    pub project_root: Option<String>,

    #[schemars(description = "Relative dir path")]
    pub directory: Option<String>,

    #[schemars(description = "Filter to specific sections (omit for all)")]
    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct CheckContextStatusArgs {
    #[schemars(description = "Absolute path to git repo root")]
    pub project_root: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct UpsertOutcome {
    pub status: String,
    /// Location of the written document
    pub path: String,
}

/// Result of auditing stored contexts against the repository.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct StatusReport {
    pub needs_creation: Vec<String>,
    pub needs_deletion: Vec<String>,
    pub needs_update: Vec<String>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.needs_creation.is_empty()
            && self.needs_deletion.is_empty()
            && self.needs_update.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
