//! MCP tool dispatch for sudo-context.

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::sync::Arc;
use sudo_context_protocol::{
    CheckContextStatusArgs, QueryContextArgs, UpsertContextArgs, SERVER_NAME,
};
use sudo_context_store::{ContextError, GitInspector};
use tokio::sync::Mutex;

mod router;

/// sudo-context MCP service
#[derive(Clone)]
pub struct SudoContextService {
    /// Tool router
    tool_router: ToolRouter<Self>,
    /// Shared per-process state
    state: Arc<ServiceState>,
}

struct ServiceState {
    inspector: GitInspector,
    /// Held for the whole of each operation: one request at a time.
    gate: Arc<Mutex<()>>,
}

impl Default for SudoContextService {
    fn default() -> Self {
        Self::new()
    }
}

impl SudoContextService {
    pub fn new() -> Self {
        Self::with_inspector(GitInspector::from_env())
    }

    pub fn with_inspector(inspector: GitInspector) -> Self {
        Self {
            tool_router: Self::tool_router(),
            state: Arc::new(ServiceState {
                inspector,
                gate: Arc::new(Mutex::new(())),
            }),
        }
    }

    /// Run a synchronous store job off the async runtime, serialized with every
    /// other job this service runs.
    pub(super) async fn run_exclusive<T, F>(
        &self,
        tool: &'static str,
        job: F,
    ) -> Result<T, CallToolResult>
    where
        T: Send + 'static,
        F: FnOnce(&GitInspector) -> Result<T, ContextError> + Send + 'static,
    {
        // The job owns the guard: the gate stays held until the blocking work
        // ends, even when the caller is dropped.
        let guard = self.state.gate.clone().lock_owned().await;
        let state = self.state.clone();
        let worker = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            job(&state.inspector)
        });
        match worker.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                if err.is_caller_error() {
                    log::debug!("{tool} rejected: {err}");
                } else {
                    log::error!("{tool} failed: {err}");
                }
                Err(router::error::context_error(&err))
            }
            Err(join_err) => {
                log::error!("{tool} worker panicked: {join_err}");
                Err(router::error::internal_error(format!(
                    "{tool} did not complete: {join_err}"
                )))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for SudoContextService {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        ServerInfo {
            instructions: Some("sudo-context stores structured context per project directory under .sudo-context/. Use 'check_context_status' to find directories that need context created, deleted, or updated; 'query_context' to read a directory's context; and 'upsert_context' to write it (sections are merged, not replaced).".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info,
            ..Default::default()
        }
    }
}

#[tool_router]
impl SudoContextService {
    /// Create or merge-update the context of one directory.
    #[tool(
        description = "Create or update directory context. Merges sections (preserves existing keys not in this call)."
    )]
    pub async fn upsert_context(
        &self,
        Parameters(request): Parameters<UpsertContextArgs>,
    ) -> Result<CallToolResult, McpError> {
        router::upsert_context::upsert_context(self, request).await
    }

    /// Read stored context for a directory.
    #[tool(description = "Retrieve stored context for a directory.")]
    pub async fn query_context(
        &self,
        Parameters(request): Parameters<QueryContextArgs>,
    ) -> Result<CallToolResult, McpError> {
        router::query_context::query_context(self, request).await
    }

    /// Audit stored contexts against the repository.
    #[tool(
        description = "Audit all directories against stored contexts. Reports which directories need context creation, deletion, or update."
    )]
    pub async fn check_context_status(
        &self,
        Parameters(request): Parameters<CheckContextStatusArgs>,
    ) -> Result<CallToolResult, McpError> {
        router::check_context_status::check_context_status(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test]
    async fn cancelled_call_keeps_gate_until_job_finishes() {
        let service = SudoContextService::with_inspector(GitInspector::new());
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let caller = service.clone();
        let call = tokio::spawn(async move {
            caller
                .run_exclusive("blocking_job", move |_| {
                    let _ = started_tx.send(());
                    let _ = release_rx.recv();
                    Ok(())
                })
                .await
        });

        tokio::task::spawn_blocking(move || started_rx.recv())
            .await
            .unwrap()
            .unwrap();
        call.abort();
        assert!(call.await.unwrap_err().is_cancelled());
        assert!(service.state.gate.try_lock().is_err());

        release_tx.send(()).unwrap();
        let reacquired =
            tokio::time::timeout(Duration::from_secs(5), service.state.gate.lock()).await;
        assert!(reacquired.is_ok());
    }
}
