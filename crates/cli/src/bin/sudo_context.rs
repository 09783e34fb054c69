use anyhow::Result;

fn main() -> Result<()> {
    sudo_context_cli::main_entry()
}
