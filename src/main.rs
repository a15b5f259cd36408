//! FpStats - NOT_EXPLOITABLE statistics for CxSAST
//!
//! Queries the CxSAST OData reporting API for the latest scan of every
//! project and writes a CSV with the number of results triaged as
//! NOT_EXPLOITABLE per project.
//!
//! Exit codes:
//!   0 - Report written
//!   1 - Runtime error (invalid arguments, API failure, unwritable report)

mod analysis;
mod api;
mod cli;
mod config;
mod models;
mod report;

use anyhow::{Context, Result};
use api::CxODataClient;
use cli::Args;
use config::Config;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Initialize logging
    init_logging(&args);

    info!("FpStats v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "cxsast_base_url={} cxsast_username={} start_date={:?} end_date={:?} report_file_path={:?}",
        args.cxsast_base_url,
        args.cxsast_username,
        args.start_date,
        args.end_date,
        args.report_file_path
    );
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(path) => {
            println!("✅ Report saved to: {}", path.display());
            Ok(())
        }
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize logging based on verbosity settings.
///
/// `-v`/`-q` win; otherwise `RUST_LOG` is honoured, defaulting to info.
fn init_logging(args: &Args) {
    let filter = match args.explicit_log_level() {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Aggregate the statistics and write the report. Returns the report path.
async fn run(args: Args) -> Result<PathBuf> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let client = CxODataClient::new(&args.cxsast_base_url, args.credentials(), &config.api)?;

    // Aggregation finishes before the report file is touched, so an API
    // failure never leaves a CSV behind.
    let summaries = analysis::aggregate(&client, &args.date_range())
        .await
        .context("Failed to collect NOT_EXPLOITABLE statistics")?;

    let path = report::write_report(&summaries, args.report_file_path.as_deref())?;

    info!(
        "Done in {:.1}s: {} projects reported",
        start_time.elapsed().as_secs_f64(),
        summaries.len()
    );
    Ok(path)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
