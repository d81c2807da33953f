//! WA Legislature tool server
//!
//! # Startup Sequence
//! 1. Initialize tracing
//! 2. Load and validate configuration from the environment
//! 3. Build the cache, upstream transport and fetch gateway
//! 4. Start the expiry sweep
//! 5. Serve the HTTP API until SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wa_leg_cache::{
    create_router, spawn_cleanup_task, AppState, CacheStore, Config, FetchGateway, HttpTransport,
    RetryPolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wa_leg_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        server = %config.server_name,
        ttl_secs = config.cache.ttl_seconds(),
        max_entries = config.cache.max_entries(),
        api_timeout_secs = config.api_timeout,
        max_attempts = config.max_attempts,
        port = config.server_port,
        "configuration loaded"
    );

    let cache = Arc::new(CacheStore::new(config.cache));
    let transport = HttpTransport::new(config.api_base_url.clone())
        .context("failed to build upstream HTTP client")?
        .with_documents_url(config.documents_base_url.clone())
        .with_search_url(config.search_url.clone());
    let policy = RetryPolicy::from_config(&config).context("invalid retry policy")?;
    let gateway = Arc::new(FetchGateway::new(Arc::clone(&cache), Arc::new(transport), policy));

    let cleanup_handle = spawn_cleanup_task(cache, config.cleanup_interval());

    let state = AppState::from_config(&config, gateway);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM, then stops the expiry sweep.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Expiry sweep aborted");
}
