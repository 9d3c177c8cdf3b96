use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::signal;
use tracing::info;

use crate::cache::token_cache::TokenCache;
use crate::config::settings::{MetricsConfig, SettingsConfig};
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::odata;
use crate::odata::resolver::EntityResolver;
use crate::security::bearer_gate::BearerGate;
use crate::server::routes;

#[derive(Clone)]
pub struct AppState {
    pub gate: BearerGate,
    pub resolver: Arc<EntityResolver>,
    pub token_cache: Arc<TokenCache>,
    pub metrics_state: MetricsState,
}

impl AppState {
    pub fn new(
        metrics: &Metrics,
        gate: BearerGate,
        resolver: Arc<EntityResolver>,
        token_cache: Arc<TokenCache>,
    ) -> Self {
        Self {
            gate,
            resolver,
            token_cache,
            metrics_state: MetricsState::new(metrics.registry.clone()),
        }
    }
}

/// Every route the service exposes. Only the OData routes require a bearer token.
pub fn build_router(state: AppState, metrics_config: &MetricsConfig) -> Router {
    Router::new()
        .merge(routes::router())
        .merge(state.metrics_state.router(metrics_config))
        .merge(odata::routes::router(&state))
        .with_state(state)
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn start(settings_config: &SettingsConfig, state: AppState) -> Result<()> {
    let metrics = get_metrics().await;
    let app = build_router(state, &settings_config.metrics);

    let bind_addr = &settings_config.server.host;
    let port = &settings_config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port))
        .await
        .with_context(|| format!("cannot bind {}:{}", bind_addr, port))?;
    info!(address = %bind_addr, port = %port, "OData server listening");

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    metrics.up.set(0);

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
