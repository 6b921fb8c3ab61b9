use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use worldsync::{api::create_app, config::WorldSyncConfig, SyncEngine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldsync=info".into()),
        )
        .init();

    info!("WorldSync starting...");

    let config = WorldSyncConfig::from_env()?;
    let engine = Arc::new(SyncEngine::new(&config.subscribers));
    let app = create_app(Arc::clone(&engine), &config);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&engine)))
        .await
        .context("HTTP server failed")?;

    info!("WorldSync stopped");
    Ok(())
}

/// Resolve on Ctrl-C, closing every subscriber session first
async fn shutdown_signal(engine: Arc<SyncEngine>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    engine.shutdown();
}
