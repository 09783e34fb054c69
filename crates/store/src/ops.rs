//! The three store operations as a closed set, with argument validation and dispatch.

use crate::audit::audit;
use crate::directory_key::DirectoryKey;
use crate::error::{ContextError, Result};
use crate::inspector::RepoInspector;
use crate::store::{ContextStore, ContextUpdate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use sudo_context_protocol::{
    CheckContextStatusArgs, ContextDocument, OperationName, QueryContextArgs, StatusReport,
    UpsertContextArgs, UpsertOutcome,
};

#[derive(Debug, Clone)]
pub enum Operation {
    UpsertContext(UpsertContext),
    QueryContext(QueryContext),
    CheckContextStatus(CheckContextStatus),
}

#[derive(Debug, Clone)]
pub struct UpsertContext {
    pub project_root: PathBuf,
    pub update: ContextUpdate,
}

#[derive(Debug, Clone)]
pub struct QueryContext {
    pub project_root: PathBuf,
    pub directory: DirectoryKey,
    pub sections: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct CheckContextStatus {
    pub project_root: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    Upserted(UpsertOutcome),
    Document(ContextDocument),
    Status(StatusReport),
}

#[derive(Debug, Clone, Copy)]
enum JsonKind {
    String,
    Object,
    Array,
}

impl JsonKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            JsonKind::String => value.is_string(),
            JsonKind::Object => value.is_object(),
            JsonKind::Array => value.is_array(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            JsonKind::String => "string",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
        }
    }
}

struct FieldSpec {
    name: &'static str,
    kind: JsonKind,
    required: bool,
}

const fn field(name: &'static str, kind: JsonKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
    }
}

const UPSERT_FIELDS: &[FieldSpec] = &[
    field("project_root", JsonKind::String, true),
    field("repo", JsonKind::String, true),
    field("git_ref", JsonKind::String, true),
    field("directory", JsonKind::String, true),
    field("sections", JsonKind::Object, true),
];

const QUERY_FIELDS: &[FieldSpec] = &[
    field("project_root", JsonKind::String, true),
    field("directory", JsonKind::String, true),
    field("sections", JsonKind::Array, false),
];

const STATUS_FIELDS: &[FieldSpec] = &[field("project_root", JsonKind::String, true)];

impl Operation {
    pub fn name(&self) -> OperationName {
        match self {
            Operation::UpsertContext(_) => OperationName::UpsertContext,
            Operation::QueryContext(_) => OperationName::QueryContext,
            Operation::CheckContextStatus(_) => OperationName::CheckContextStatus,
        }
    }

    /// Resolve `name` and validate loosely-typed JSON `args` into an operation.
    pub fn parse(name: &str, args: &Value) -> Result<Self> {
        let op = OperationName::from_name(name)
            .ok_or_else(|| ContextError::UnknownOperation(name.to_string()))?;
        let args = args
            .as_object()
            .ok_or_else(|| ContextError::InvalidParameterType {
                field: "arguments".to_string(),
                expected: "object",
            })?;

        match op {
            OperationName::UpsertContext => {
                let args: UpsertContextArgs = decode_args(args, UPSERT_FIELDS)?;
                UpsertContext::try_from(args).map(Operation::UpsertContext)
            }
            OperationName::QueryContext => {
                let args: QueryContextArgs = decode_args(args, QUERY_FIELDS)?;
                QueryContext::try_from(args).map(Operation::QueryContext)
            }
            OperationName::CheckContextStatus => {
                let args: CheckContextStatusArgs = decode_args(args, STATUS_FIELDS)?;
                CheckContextStatus::try_from(args).map(Operation::CheckContextStatus)
            }
        }
    }

    pub fn execute(self, inspector: &dyn RepoInspector) -> Result<OperationOutput> {
        log::debug!("executing {}", self.name().as_str());
        match self {
            Operation::UpsertContext(op) => op.execute().map(OperationOutput::Upserted),
            Operation::QueryContext(op) => op.execute().map(OperationOutput::Document),
            Operation::CheckContextStatus(op) => {
                op.execute(inspector).map(OperationOutput::Status)
            }
        }
    }
}

impl UpsertContext {
    pub fn execute(self) -> Result<UpsertOutcome> {
        let store = ContextStore::open(&self.project_root);
        let path = store.upsert(self.update)?;
        Ok(UpsertOutcome {
            status: "ok".to_string(),
            path: path.to_string_lossy().to_string(),
        })
    }
}

impl QueryContext {
    pub fn execute(self) -> Result<ContextDocument> {
        ContextStore::open(&self.project_root).query(&self.directory, self.sections.as_deref())
    }
}

impl CheckContextStatus {
    pub fn execute(self, inspector: &dyn RepoInspector) -> Result<StatusReport> {
        audit(&ContextStore::open(&self.project_root), inspector)
    }
}

impl TryFrom<UpsertContextArgs> for UpsertContext {
    type Error = ContextError;

    fn try_from(args: UpsertContextArgs) -> Result<Self> {
        let project_root = require(args.project_root, "project_root")?;
        let repo = require(args.repo, "repo")?;
        let git_ref = require(args.git_ref, "git_ref")?;
        let directory = require(args.directory, "directory")?;
        let sections = require(args.sections, "sections")?;
        Ok(Self {
            project_root: project_root_dir(project_root)?,
            update: ContextUpdate {
                repo,
                git_ref,
                directory: DirectoryKey::parse(&directory)?,
                sections,
            },
        })
    }
}

impl TryFrom<QueryContextArgs> for QueryContext {
    type Error = ContextError;

    fn try_from(args: QueryContextArgs) -> Result<Self> {
        let project_root = require(args.project_root, "project_root")?;
        let directory = require(args.directory, "directory")?;
        Ok(Self {
            project_root: project_root_dir(project_root)?,
            directory: DirectoryKey::parse(&directory)?,
            sections: args.sections,
        })
    }
}

impl TryFrom<CheckContextStatusArgs> for CheckContextStatus {
    type Error = ContextError;

    fn try_from(args: CheckContextStatusArgs) -> Result<Self> {
        let project_root = require(args.project_root, "project_root")?;
        Ok(Self {
            project_root: project_root_dir(project_root)?,
        })
    }
}

fn require<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| ContextError::MissingParameter(field.to_string()))
}

fn project_root_dir(raw: String) -> Result<PathBuf> {
    let path = PathBuf::from(raw.trim());
    if raw.trim().is_empty() || !path.is_dir() {
        return Err(ContextError::InvalidParameterType {
            field: "project_root".to_string(),
            expected: "an existing directory",
        });
    }
    Ok(path)
}

/// Missing keys first, then wrong types, then element types, each naming the key.
fn decode_args<T: DeserializeOwned>(args: &Map<String, Value>, fields: &[FieldSpec]) -> Result<T> {
    for rule in fields.iter().filter(|rule| rule.required) {
        if !args.contains_key(rule.name) {
            return Err(ContextError::MissingParameter(rule.name.to_string()));
        }
    }

    for rule in fields {
        let Some(value) = args.get(rule.name) else {
            continue;
        };
        if !rule.required && value.is_null() {
            continue;
        }
        if !rule.kind.matches(value) {
            return Err(ContextError::InvalidParameterType {
                field: rule.name.to_string(),
                expected: rule.kind.describe(),
            });
        }
        let elements_ok = match value {
            Value::Object(map) => map.values().all(Value::is_string),
            Value::Array(items) => items.iter().all(Value::is_string),
            _ => true,
        };
        if !elements_ok {
            return Err(ContextError::InvalidParameterType {
                field: rule.name.to_string(),
                expected: match rule.kind {
                    JsonKind::Object => "object with string values",
                    _ => "array of strings",
                },
            });
        }
    }

    serde_json::from_value(Value::Object(args.clone())).map_err(|err| {
        log::debug!("argument decoding failed after validation: {err}");
        ContextError::InvalidParameterType {
            field: "arguments".to_string(),
            expected: "object",
        }
    })
}
