//! CLI entry point for the GTFS feed loader.
//!
//! Reads database settings from a TOML config file, discovers the feed CSV
//! files in the input directory, and bulk-loads each into CrateDB on a
//! bounded worker pool.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use gtfs_feed_loader::config::Config;
use gtfs_feed_loader::runner;
use gtfs_feed_loader::session::CrateSession;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_feed_loader")]
#[command(about = "Bulk-loads GTFS schedule CSV feeds into CrateDB", long_about = None)]
struct Cli {
    /// TOML file with database connection settings
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Directory containing the feed CSV files to load
    #[arg(short, long, value_name = "DIR")]
    input: PathBuf,

    /// Maximum number of files loaded in parallel
    #[arg(short, long, default_value_t = runner::DEFAULT_WORKERS)]
    workers: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs_feed_loader.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_feed_loader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let database = config.database;

    runner::run(&cli.input, cli.workers, move || {
        CrateSession::connect(&database)
    })
    .await?;

    Ok(())
}
