//! Persistence Playground
//!
//! Runs a simulated editing session against the page persistence worker: one thread
//! edits pages and requests page saves, another autosaves metadata on a timer. When
//! the session ends the document is closed, the queue is drained and a report is
//! printed as JSON.

mod logging;
mod session;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use page_persistence::PersistenceConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use logging::initialize_logging;
use session::{run_session, SessionOptions};

#[derive(Parser, Debug)]
#[command(name = "persistence-playground")]
#[command(about = "Simulated editing session that exercises the page persistence worker")]
#[command(version)]
struct Cli {
    /// TOML configuration file (PAGE_PERSISTENCE_* environment variables override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the document is written to
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Number of pages in the document
    #[arg(short, long, default_value = "5")]
    pages: usize,

    /// Number of edits made by the editor thread
    #[arg(short, long, default_value = "50")]
    edits: usize,

    /// Delay between edits in milliseconds
    #[arg(long, default_value = "10")]
    edit_ms: u64,

    /// Autosave interval in milliseconds
    #[arg(long, default_value = "100")]
    autosave_ms: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (pretty, compact, json)
    #[arg(long, default_value = "compact")]
    log_format: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli.log_level, &cli.log_format)?;
    info!("Starting persistence playground v{}", env!("CARGO_PKG_VERSION"));

    if cli.autosave_ms == 0 {
        return Err(anyhow!("--autosave-ms must be greater than 0"));
    }

    let config = PersistenceConfig::load(cli.config.as_deref())
        .context("Failed to load persistence configuration")?;
    info!(?config, "Configuration loaded");

    let options = SessionOptions {
        pages: cli.pages,
        edits: cli.edits,
        edit_interval: Duration::from_millis(cli.edit_ms),
        autosave_interval: Duration::from_millis(cli.autosave_ms),
    };

    let report = run_session(&config, &cli.data_dir, &options)?;
    println!("{}", serde_json::to_string_pretty(&report.to_json())?);

    if report.summary.failures > 0 {
        return Err(anyhow!("{} saves failed", report.summary.failures));
    }

    info!("Session complete");
    Ok(())
}
