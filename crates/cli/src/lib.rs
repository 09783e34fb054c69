//! `sudo-context`: command line access to the per-directory context store.
//!
//! Every subcommand prints one JSON response on stdout
//! (`{"status": "ok", "data": ...}` or `{"status": "error", "error": {...}}`)
//! and exits non-zero on error. Logs go to stderr.

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use request::{CommandRequest, CommandResponse};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use sudo_context_protocol::{
    serialize_json, serialize_json_pretty, CheckContextStatusArgs, QueryContextArgs, Sections,
    StatusReport, UpsertContextArgs,
};
use sudo_context_store::{
    CheckContextStatus, GitInspector, Operation, QueryContext, UpsertContext, ROOT_KEY,
};

mod request;

/// Default project root when `--root` is not given.
pub const ROOT_ENV: &str = "SUDO_CONTEXT_ROOT";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "sudo-context")]
#[command(about = "Per-directory context notes for git projects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (default: $SUDO_CONTEXT_ROOT, then the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Pretty-print JSON response
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge sections into a directory's context
    Upsert(UpsertArgs),

    /// Read a directory's context
    Query(QueryArgs),

    /// Report directories whose context is missing, orphaned, or stale
    Status(StatusArgs),

    /// Execute a JSON request: {"action": "...", "payload": {...}}
    Command(CommandArgs),
}

#[derive(Args)]
struct UpsertArgs {
    /// Repository identifier, e.g. owner/name
    #[arg(long)]
    repo: String,

    /// Commit the context describes
    #[arg(long)]
    git_ref: String,

    /// Directory relative to the project root
    #[arg(long = "dir", default_value = ROOT_KEY)]
    directory: String,

    /// Section as NAME=TEXT (repeatable)
    #[arg(long = "section", value_name = "NAME=TEXT", value_parser = parse_section)]
    sections: Vec<(String, String)>,

    /// JSON object of sections to merge before any --section values
    #[arg(long)]
    sections_file: Option<PathBuf>,
}

#[derive(Args)]
struct QueryArgs {
    /// Directory relative to the project root
    #[arg(long = "dir", default_value = ROOT_KEY)]
    directory: String,

    /// Only return these sections (repeatable)
    #[arg(long = "section", value_name = "NAME")]
    sections: Vec<String>,
}

#[derive(Args)]
struct StatusArgs {
    /// Exit with status 1 when any directory needs attention
    #[arg(long)]
    check: bool,
}

#[derive(Args)]
struct CommandArgs {
    /// Inline JSON request (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing the JSON request
    #[arg(long)]
    file: Option<PathBuf>,
}

fn parse_section(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TEXT, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("section name must not be empty".to_string());
    }
    Ok((name.to_string(), text.to_string()))
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let root = resolve_root(cli.root)?;
    let inspector = GitInspector::from_env();
    log::debug!("project root {}", root.display());

    let mut stale = false;
    let response = match cli.command {
        Commands::Upsert(args) => {
            let sections = collect_sections(&args)?;
            let op = UpsertContext::try_from(UpsertContextArgs {
                project_root: Some(root.to_string_lossy().to_string()),
                repo: Some(args.repo),
                git_ref: Some(args.git_ref),
                directory: Some(args.directory),
                sections: Some(sections),
            })
            .map(Operation::UpsertContext);
            request::run(op, &inspector)
        }
        Commands::Query(args) => {
            let op = QueryContext::try_from(QueryContextArgs {
                project_root: Some(root.to_string_lossy().to_string()),
                directory: Some(args.directory),
                sections: Some(args.sections),
            })
            .map(Operation::QueryContext);
            request::run(op, &inspector)
        }
        Commands::Status(args) => {
            let op = CheckContextStatus::try_from(CheckContextStatusArgs {
                project_root: Some(root.to_string_lossy().to_string()),
            })
            .map(Operation::CheckContextStatus);
            let response = request::run(op, &inspector);
            stale = args.check && !response.is_error() && !report_is_clean(&response);
            response
        }
        Commands::Command(args) => {
            let raw = read_payload(&args)?;
            let request: CommandRequest =
                serde_json::from_str(&raw).context("Invalid JSON passed to --json/--file")?;
            request::execute(request, &root, &inspector)
        }
    };

    let output = if cli.pretty {
        serialize_json_pretty(&response)?
    } else {
        serialize_json(&response)?
    };
    print_stdout(&output)?;

    if response.is_error() || stale {
        std::process::exit(1);
    }
    Ok(())
}

fn resolve_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = flag {
        return Ok(root);
    }
    if let Some(root) = std::env::var_os(ROOT_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    std::env::current_dir().context("Failed to determine the current directory")
}

fn collect_sections(args: &UpsertArgs) -> Result<Sections> {
    let mut sections = Sections::new();
    if let Some(path) = &args.sections_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sections from {}", path.display()))?;
        let from_file: Sections = serde_json::from_str(&raw).with_context(|| {
            format!(
                "{} must hold a JSON object with string values",
                path.display()
            )
        })?;
        sections.extend(from_file);
    }
    sections.extend(args.sections.iter().cloned());
    Ok(sections)
}

fn report_is_clean(response: &CommandResponse) -> bool {
    serde_json::from_value::<StatusReport>(response.data.clone())
        .map_or(true, |report| report.is_clean())
}

fn read_payload(args: &CommandArgs) -> Result<String> {
    if let Some(raw) = &args.json {
        return Ok(raw.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read JSON from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("Command request is empty. Provide --json, --file, or pipe JSON via stdin.");
    }

    Ok(buffer)
}
