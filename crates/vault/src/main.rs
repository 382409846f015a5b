//! `vault`: card field protection service entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP spans).
//! 3. Open the file-backed key store and build the [`CardVault`].
//! 4. Load or create the encryption key; refuse to start if it is unavailable.
//! 5. Build the Axum router and serve until Ctrl-C.

mod config;
mod server;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use card_core::{CardVault, FileKeyStore, KeyManager};
use tracing::info;

use config::Config;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otlp_endpoint(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        otlp = cfg.otlp_endpoint().is_some(),
        "card-vault starting"
    );

    // -----------------------------------------------------------------------
    // 3. Key store
    // -----------------------------------------------------------------------
    let store = FileKeyStore::new(&cfg.key_store_dir);
    let keys = KeyManager::with_storage_id(Arc::new(store), cfg.key_storage_id.clone());
    let vault = CardVault::with_key_manager(keys);

    // -----------------------------------------------------------------------
    // 4. Key initialisation
    // -----------------------------------------------------------------------
    vault
        .warm_up()
        .await
        .context("failed to load or create the card encryption key")?;
    let key_id = vault.keys().key_id().unwrap_or_default();
    info!(
        key_store_dir = %cfg.key_store_dir,
        key_id = %key_id,
        "encryption key ready"
    );

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(AppState::new(vault));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("card-vault stopped");
    telemetry::shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
