//! sudo-context MCP server
//!
//! Stores structured, per-directory context for a project and audits it against
//! git so agents know which directories need context written, removed, or
//! refreshed.
//!
//! ## Tools
//!
//! - `upsert_context` - create or merge-update the context of one directory
//! - `query_context` - read a directory's context, optionally filtered to sections
//! - `check_context_status` - report directories needing creation, deletion, or update
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "sudo-context": {
//!       "command": "sudo-context-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod tools;

pub use tools::SudoContextService;

pub async fn main_entry() -> Result<()> {
    // stdout carries the MCP protocol; logs go to stderr only.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting sudo-context MCP server");

    let service = SudoContextService::new();
    let server = service.serve(stdio()).await?;
    server.waiting().await?;

    log::info!("sudo-context MCP server stopped");
    Ok(())
}
