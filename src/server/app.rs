//! Router, shared state, and listener for the prober HTTP server
//!
//! - `/startup`, `/readiness`, `/liveness` - delayed probes
//! - `/config` - probe delay updates
//! - `/delay/{seconds}`, `/graceDelay/{seconds}` - artificial latency
//! - `/metrics` - Prometheus metrics in text format

use super::handlers;
use super::metrics::{track_requests, SharedMetrics};
use super::shutdown::ShutdownSignal;
use crate::delays::DelayConfig;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// State shared by every handler
///
/// Built once per server; clones share the same delays, metrics, and
/// shutdown flag.
#[derive(Clone)]
pub struct ServerState {
    delays: DelayConfig,
    metrics: SharedMetrics,
    shutdown: ShutdownSignal,
}

impl ServerState {
    pub fn new(delays: DelayConfig, metrics: SharedMetrics, shutdown: ShutdownSignal) -> Self {
        Self {
            delays,
            metrics,
            shutdown,
        }
    }

    pub fn delays(&self) -> &DelayConfig {
        &self.delays
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }
}

/// Prometheus metrics handler
///
/// Returns metrics in Prometheus text format for scraping.
async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

/// Build the router for probe, delay, config, and metrics endpoints
///
/// Everything except `/metrics` is counted in `active_requests` and
/// `http_requests_total`.
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/startup", get(handlers::startup))
        .route("/readiness", get(handlers::readiness))
        .route("/liveness", get(handlers::liveness))
        .route("/config", post(handlers::update_config))
        .route("/delay/{seconds}", get(handlers::delay))
        .route("/graceDelay/{seconds}", get(handlers::grace_delay))
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .route("/metrics", get(self::metrics))
        .with_state(state)
}

/// Serve on an already-bound listener until the shutdown signal fires
///
/// Once draining, the listener stops accepting and this returns after
/// in-flight requests have completed.
pub async fn serve(listener: TcpListener, state: ServerState) -> std::io::Result<()> {
    let mut shutdown = state.shutdown.clone();
    let app = build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
}

/// Bind `0.0.0.0:port` and serve
///
/// A bind failure is returned like any other server error, so it reaches
/// the shutdown coordinator the same way.
pub async fn run_server(port: u16, state: ServerState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    // Log after successful bind - server is actually listening
    info!(port = %port, "Prober listening (HTTP)");

    serve(listener, state).await
}
