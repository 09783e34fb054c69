use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    sudo_context_mcp::main_entry().await
}
