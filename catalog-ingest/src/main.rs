//! catalog-ingest - batch ingestion of song, movie and app records
//!
//! Runs one pass and exits: fetch the manifest, ingest every data link not
//! yet in the `processed` ledger, close the database. The exit status is
//! non-zero when the pass aborts or any link failed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use catalog_common::config::{ConfigOverrides, ConfigResolver};
use catalog_common::Database;
use catalog_ingest::services::SourceClient;
use catalog_ingest::Ingestor;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for catalog-ingest
#[derive(Parser, Debug)]
#[command(name = "catalog-ingest")]
#[command(about = "Ingest new song, movie and app data files into the catalog database")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the data host (manifest and data files)
    #[arg(long)]
    base_url: Option<String>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration is resolved before the real subscriber exists, so its
    // warnings go through a temporary one.
    let bootstrap_logger = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .finish();
    let config = tracing::subscriber::with_default(bootstrap_logger, || {
        ConfigResolver::new(ConfigOverrides {
            config_path: args.config.clone(),
            base_url: args.base_url.clone(),
            database_path: args.database.clone(),
        })
        .resolve()
    })
    .context("Failed to resolve configuration")?;

    tracing_subscriber::registry()
        .with(env_filter(&config.logging.level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting catalog-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Base URL: {}", config.base_url);
    info!("Database: {}", config.database_path.display());

    let db = Database::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    let client = SourceClient::from_config(&config).context("Failed to build HTTP client")?;

    let mut ingestor = Ingestor::new(db, client);
    let outcome = ingestor.run().await;
    ingestor.close().await;

    let summary = outcome.context("Ingestion run aborted")?;
    if !summary.is_success() {
        for failure in &summary.failed {
            error!(link = %failure.link, "{}", failure.reason);
        }
        anyhow::bail!(
            "{} of {} new links failed",
            summary.failed.len(),
            summary.new_links
        );
    }

    Ok(())
}

/// `RUST_LOG` when set, otherwise the configured level
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
