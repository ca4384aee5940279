//! # Wallet Background
//!
//! Entry point of the wallet background process.
//!
//! ## Startup Sequence
//!
//! 1. Install logging on stderr (`RUST_LOG`, default `info`)
//! 2. Load and validate configuration, generating an auth token if unset
//! 3. Build the service container
//! 4. Restore persisted state, spawn forwarding and expiry tasks
//! 5. Serve the host transport until Ctrl+C

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wb_runtime::{server, RuntimeConfig, ServiceContainer};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = RuntimeConfig::load().context("invalid configuration")?;
    if config.ensure_auth_token() {
        // The host reads the per-launch token from the first stdout line.
        if let Some(token) = &config.server.auth_token {
            println!("WB_AUTH_TOKEN={token}");
        }
        info!("Generated a per-launch auth token");
    }
    info!(
        listen = %config.listen_addr()?,
        data_file = %config.storage.data_file.display(),
        default_chain = config.networks.default_chain,
        "Starting wallet background"
    );

    let container = Arc::new(ServiceContainer::new(config)?);
    let tasks = container.start().await?;

    server::run(container, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await?;

    for task in tasks {
        task.abort();
    }
    info!("Shutdown complete");
    Ok(())
}
