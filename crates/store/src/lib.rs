//! # sudo-context store
//!
//! Persisted per-directory context for a project, plus an audit that reports
//! which directories lack context, which contexts are orphaned, and which are
//! stale against version control.
//!
//! ```text
//! <project_root>/.sudo-context/
//!     context.json            <- "."
//!     src/context.json        <- "src"
//!     src/tools/context.json  <- "src/tools"
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use sudo_context_store::{audit, ContextStore, GitInspector};
//!
//! fn main() -> sudo_context_store::Result<()> {
//!     let store = ContextStore::open("/path/to/project");
//!     let report = audit(&store, &GitInspector::new())?;
//!     println!("{} directories need context", report.needs_creation.len());
//!     Ok(())
//! }
//! ```

mod audit;
mod directory_key;
mod error;
mod inspector;
mod layout;
mod ops;
mod store;

pub use audit::audit;
pub use directory_key::{DirectoryKey, ROOT_KEY};
pub use error::{ContextError, Result};
pub use inspector::{
    changed_since, is_ignored, tracked_directories, GitInspector, RepoInspector, GIT_BIN_ENV,
};
pub use layout::{StorageLayout, DOCUMENT_FILE_NAME, STORAGE_DIR_NAME};
pub use ops::{CheckContextStatus, Operation, OperationOutput, QueryContext, UpsertContext};
pub use store::{utc_timestamp, ContextStore, ContextUpdate};
