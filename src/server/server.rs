use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::routes::GatewayState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub gateway_state: GatewayState,
}

impl AppState {
    pub fn new(metrics: &Metrics, gateway_state: GatewayState) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            gateway_state,
        }
    }
}

/// Gateway routes plus the metrics route when enabled.
pub fn router(settings_config: &SettingsConfig, state: AppState) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.gateway_state.router())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn start(
    settings_config: &SettingsConfig,
    gateway_state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, gateway_state);
    let app = router(settings_config, state);

    let bind_addr = &settings_config.server.host;
    let port = &settings_config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port))
        .await
        .with_context(|| format!("unable to bind {}:{}", bind_addr, port))?;
    info!("listening on {}:{}", bind_addr, port);

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed")?;
    metrics.up.set(0);
    Ok(())
}
