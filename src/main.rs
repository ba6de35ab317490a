mod assets;
mod config;
mod error;
mod handlers;
mod keygen;
mod memory;
mod models;
mod routes;
mod spanner;
mod state;
mod store;

use anyhow::Context;
use assets::DirAssetSource;
use config::{Config, StoreBackend};
use keygen::KeyGenerator;
use memory::MemoryBackend;
use spanner::SpannerBackend;
use state::AppState;
use std::sync::Arc;
use store::{DocumentStore, KvBackend};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("haste-kv starting");

    let config = Config::from_env()?;
    config.log_startup();

    let backend: Arc<dyn KvBackend> = match &config.store {
        StoreBackend::Memory => Arc::new(MemoryBackend::new()),
        StoreBackend::Spanner(spanner) => Arc::new(SpannerBackend::connect(spanner).await?),
    };

    let state = AppState {
        documents: DocumentStore::new(backend, KeyGenerator::new(config.key_length)),
        assets: Arc::new(DirAssetSource::new(&config.assets_dir)),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    tracing::info!("Listening on {}", config.bind_address());

    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
