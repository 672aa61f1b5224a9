//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `url_verdict` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use url_verdict::incident::{IncidentService, IncidentStore};
use url_verdict::initialization::init_logger_with;
use url_verdict::{scan_url, LogFormat, LogLevel, ScanConfig, ScanContext};

#[derive(Parser, Debug)]
#[command(name = "url_verdict", version, about = "Multi-layer URL risk scanner")]
struct Cli {
    /// URL to scan (scheme optional; https:// is assumed)
    url: String,

    /// SQLite database for incident and feedback storage
    #[arg(long, default_value = "./url_verdict.db")]
    db: PathBuf,

    /// Skip incident persistence entirely
    #[arg(long)]
    no_db: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Maximum redirect hops followed per trace
    #[arg(long, default_value_t = 10)]
    max_redirects: usize,

    /// Logging level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "plain")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger_with(cli.log_level.into(), cli.log_format)
        .context("Failed to initialize logger")?;

    let config = ScanConfig {
        timeout_seconds: cli.timeout,
        max_redirects: cli.max_redirects,
        db_path: if cli.no_db { None } else { Some(cli.db.clone()) },
        ..Default::default()
    };

    let ctx = ScanContext::new(config.clone()).context("Failed to build scan context")?;

    let (bundle, verdict) = match scan_url(&cli.url, &ctx).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("url_verdict error: {e}");
            process::exit(1);
        }
    };

    let store = match &config.db_path {
        Some(path) => match IncidentStore::open(path).await {
            Ok(store) => Some(store),
            Err(e) => {
                // Scan results are still printed; only persistence is lost
                eprintln!("incident store unavailable: {e}");
                None
            }
        },
        None => None,
    };

    let service = IncidentService::new(store, config.weights.clone());
    let report = service.generate_incident_report(&bundle, &verdict).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
