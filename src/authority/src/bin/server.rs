//! # aclgate HTTP server
//!
//! ## Endpoints
//!
//! - `GET /UserACLs` - Access tokens for a user
//! - `GET /health` - Health check
//!
//! ## Configuration
//!
//! Environment variables:
//! - `HOST` / `PORT` - Bind address (default: 0.0.0.0:8345)
//! - `ACLGATE_REGISTRY` - Connection registry JSON (default: registry.json)
//! - `MAPPING_WORKERS` / `AUTHORITY_WORKERS` - Worker tasks per queue (default: 10)
//! - `REQUEST_TIMEOUT_SECS` - Per-request bound, 0 disables it (default: 300)
//! - `DETECT_MAPPING_CYCLES` - Reject cyclic mapping graphs (default: false)
//! - `RUST_LOG` - Log filter (falls back to `LOG_LEVEL`, then info)

use aclgate_authority::mapping::evaluation_order;
use aclgate_authority::{
    build_router, connectors, AclService, AppState, ServiceConfig, StaticRegistry, WorkerPool,
};
use aclgate_core::{AuthorizationResponse, ConnectionRegistry, UserRecord};
use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }

    info!("Starting graceful shutdown");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting aclgate server v{}", aclgate_authority::VERSION);
    info!("Configuration:");
    info!("  Address: {}", config.bind_address());
    info!("  Registry: {}", config.registry_path.display());
    info!("  Mapping workers: {}", config.mapping_workers);
    info!("  Authority workers: {}", config.authority_workers);
    info!("  Request timeout: {}s", config.request_timeout_secs);

    let registry = StaticRegistry::load(&config.registry_path)
        .await
        .with_context(|| format!("loading registry {}", config.registry_path.display()))?;
    if config.detect_mapping_cycles {
        let mappers = registry.mapping_connections().await?;
        evaluation_order(&mappers).context("checking mapping connections")?;
    }

    let mapping_pool = WorkerPool::<UserRecord>::start(
        "mapping",
        config.mapping_workers,
        Arc::new(connectors::mapping_catalog()),
    );
    let authority_pool = WorkerPool::<AuthorizationResponse>::start(
        "authority",
        config.authority_workers,
        Arc::new(connectors::authority_catalog()),
    );

    let service = AclService::new(
        Arc::new(registry),
        mapping_pool.queue(),
        authority_pool.queue(),
        config.engine_config(),
    );

    let shutdown = CancellationToken::new();
    let app = build_router(AppState::new(Arc::new(service), shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("binding {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("HTTP server error")?;

    mapping_pool.shutdown().await;
    authority_pool.shutdown().await;
    info!("Server shut down gracefully");

    Ok(())
}
