//! Scene Curator - Entry Point

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scene_curator::{config::AppConfig, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "scene_curator=info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config from environment: {e}, using defaults");
        AppConfig::default()
    });

    if config.catalog.access_token.is_none() {
        warn!("No catalog access token set, every search will come back empty");
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        catalog = %config.catalog.base_url,
        similarity_configured = config.similarity.api_key.is_some(),
        concurrency = config.pipeline.effective_concurrency(),
        "Starting Scene Curator"
    );

    let addr = config.server.socket_addr();
    let state = server::AppState::new(config).context("Failed to build upstream clients")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(%addr, "Server listening");

    axum::serve(listener, server::create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler");
        tokio::select! {
            _ = signal::ctrl_c() => info!("Received Ctrl+C, starting graceful shutdown"),
            _ = terminate.recv() => info!("Received SIGTERM, starting graceful shutdown"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
        }
        info!("Received Ctrl+C, starting graceful shutdown");
    }
}
