//! API server setup

use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use zoo_core::{AdminService, CascadeConfig};
use zoo_store::{Backend, MemoryBackend, SystemClock};

use crate::config::{AppConfig, BackendKind};
use crate::routes::create_router;
use crate::state::AppState;

/// Open the configured storage backend
///
/// # Errors
/// Fails when DynamoDB is selected in a build without the `dynamodb`
/// feature.
pub async fn connect_backend(kind: BackendKind) -> anyhow::Result<Arc<dyn Backend>> {
    match kind {
        BackendKind::Memory => {
            tracing::warn!("using in-memory backend; data is lost on exit");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "dynamodb")]
        BackendKind::Dynamodb => {
            tracing::info!("using DynamoDB backend");
            Ok(Arc::new(zoo_store::DynamoBackend::from_env().await))
        }
        #[cfg(not(feature = "dynamodb"))]
        BackendKind::Dynamodb => {
            anyhow::bail!("this build has no DynamoDB support; rebuild with --features dynamodb")
        }
    }
}

/// Build the domain service for a configuration
///
/// # Errors
/// Propagates backend connection failures.
pub async fn build_service(config: &AppConfig) -> anyhow::Result<AdminService> {
    for (kind, table) in config.tables.iter() {
        tracing::debug!(entity = %kind, table = %table.table_name, key = %table.primary_key, "table configured");
    }
    let backend = connect_backend(config.backend).await?;
    Ok(AdminService::new(
        &config.tables,
        CascadeConfig::default(),
        backend,
        Arc::new(SystemClock),
    ))
}

/// Router with middleware for a service
pub fn build_app(service: AdminService) -> Router {
    create_router(AppState::new(service)).layer(TraceLayer::new_for_http())
}

/// Create the API server
///
/// # Errors
/// Fails on backend connection or an unparseable bind address.
pub async fn create_server(config: &AppConfig) -> anyhow::Result<(Router, SocketAddr)> {
    let service = build_service(config).await?;
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;
    Ok((build_app(service), addr))
}

/// Run the API server until the process is stopped
///
/// # Errors
/// Fails when the server cannot be created or the listener cannot bind.
pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    let (router, addr) = create_server(config).await?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, backend = ?config.backend, "zoo admin API listening");

    axum::serve(listener, router).await?;
    Ok(())
}
