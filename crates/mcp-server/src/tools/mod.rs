//! MCP tool surface: service state and one router module per tool.

mod dispatch;

pub use dispatch::SudoContextService;
