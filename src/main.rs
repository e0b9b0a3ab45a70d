//! labelsweep - Entry point for the migration worker

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use labelsweep::config::{ConfigError, ConfigLoader, Environment, LogLevel, Settings};
use labelsweep::migration::{LoggingDeviceCategorizer, MigrationService, Partition};
use labelsweep::storage::Database;

#[derive(Parser)]
#[command(name = "labelsweep")]
#[command(about = "Reconcile folder categories and backfill message flags for a mail store")]
#[command(version)]
struct Cli {
    /// This worker's slot, in 0..worker-count (default 0; ignored without a count)
    #[arg(long)]
    worker_index: Option<i64>,

    /// Number of workers the account space is split across; unset means one worker owns all
    #[arg(long)]
    worker_count: Option<i64>,

    /// Extra config file, applied over every other config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mail store path, overriding the configured one
    #[arg(long)]
    database: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Migration failed: {:#}", e);
        std::process::exit(1);
    }
}

fn load_settings(extra: Option<&Path>) -> Result<(Environment, Settings), ConfigError> {
    let mut loader = ConfigLoader::from_env()?;
    if let Some(path) = extra {
        loader = loader.with_override(path);
    }
    Ok((loader.environment(), loader.load()?))
}

async fn run(cli: Cli) -> Result<()> {
    let loaded = load_settings(cli.config.as_deref());

    // Logging comes up before config errors are returned so they get logged.
    let level = cli
        .log_level
        .or_else(|| loaded.as_ref().ok().map(|(_, s)| s.log_level))
        .unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive())),
        )
        .init();

    let (environment, settings) = loaded?;
    tracing::info!(%environment, "Starting labelsweep");

    let partition = Partition::from_args(cli.worker_index, cli.worker_count)?;

    let path = match cli.database {
        Some(path) => path,
        None => settings.database_path()?.to_path_buf(),
    };
    let db = Database::open(&path)
        .await
        .with_context(|| format!("opening mail store {}", path.display()))?;

    let service = MigrationService::new(db, Arc::new(LoggingDeviceCategorizer));
    let report = service.run(&partition).await?;

    tracing::info!(
        %partition,
        accounts = report.accounts.len(),
        duration_ms = report.duration_ms,
        "Done"
    );
    Ok(())
}
