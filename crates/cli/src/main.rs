mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seedsweep_core::{
    load_config, validate_config, Orchestrator, QBittorrentFactory, RemoteClientFactory,
    SweepMode,
};

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Per-server failures are reported in the summary and do not fail the
    // process; only errors that stop the sweep as a whole do.
    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mode = SweepMode::from_debug_flag(cli.debug);

    // Determine config path
    let config_path = std::env::var("SEEDSWEEP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        servers = config.remote_servers.len(),
        debug = mode.is_debug(),
        "Configuration loaded successfully"
    );
    for server in &config.remote_servers {
        info!(server = %server.name, url = %server.url, "Configured server");
    }

    let factory: Arc<dyn RemoteClientFactory> = Arc::new(QBittorrentFactory);
    let summary = Orchestrator::new(config, factory)
        .run(mode)
        .await
        .context("Sweep aborted")?;

    if !summary.failed_servers.is_empty() {
        info!(
            failed = ?summary.failed_servers,
            "Sweep completed with server errors"
        );
    }

    Ok(())
}
