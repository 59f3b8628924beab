//! Prometheus metrics for the probe and delay endpoints
//!
//! - `active_requests` - requests currently inside an instrumented handler
//! - `http_requests_total{method,endpoint,statusCode}` - completed requests
//! - `prober_build_info{version}` - constant 1, identifies the build

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metrics output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Metric collectors backed by a private registry
///
/// Each instance owns its registry, so several servers in one process
/// (tests in particular) never see each other's counts.
pub struct Metrics {
    registry: Registry,
    active_requests: IntGauge,
    requests_total: IntCounterVec,
}

/// Metrics handle shared between the router and its middleware
pub type SharedMetrics = Arc<Metrics>;

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let active_requests = IntGauge::new("active_requests", "Number of active requests")?;
        registry.register(Box::new(active_requests.clone()))?;

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Number of HTTP requests"),
            &["method", "endpoint", "statusCode"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let build_info = IntGaugeVec::new(
            Opts::new("prober_build_info", "Build information for prober"),
            &["version"],
        )?;
        registry.register(Box::new(build_info.clone()))?;
        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1);

        Ok(Self {
            registry,
            active_requests,
            requests_total,
        })
    }

    /// Count a request as in flight until the returned guard is dropped
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.active_requests.inc();
        InFlightGuard {
            gauge: self.active_requests.clone(),
        }
    }

    /// Record one completed request
    pub fn record_request(&self, method: &str, endpoint: &str, status_code: u16) {
        let status = status_code.to_string();
        self.requests_total
            .with_label_values(&[method, endpoint, &status])
            .inc();
    }

    /// Current value of the in-flight gauge
    pub fn active_requests(&self) -> i64 {
        self.active_requests.get()
    }

    /// Completed-request count for one (method, endpoint, status) tuple
    pub fn request_count(&self, method: &str, endpoint: &str, status_code: u16) -> u64 {
        let status = status_code.to_string();
        self.requests_total
            .with_label_values(&[method, endpoint, &status])
            .get()
    }

    /// Render all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Create the shared metrics registry
pub fn create_metrics() -> Result<SharedMetrics, MetricsError> {
    Ok(Arc::new(Metrics::new()?))
}

/// Decrements `active_requests` when dropped
///
/// Dropping covers every exit: a normal response, an early validation
/// failure, and a client disconnect that cancels the handler future.
#[must_use = "the request stops counting as in flight when the guard is dropped"]
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Render an axum route template as an `endpoint` label
///
/// Path parameters use the `:name` form (`/delay/:seconds`) so existing
/// dashboards and alerts keep matching.
pub fn endpoint_label(template: &str) -> String {
    template
        .split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => format!(":{}", name),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware instrumenting every route it is layered over
///
/// Must be installed with `route_layer` so the matched route template is
/// available, keeping the `endpoint` label bounded (`/delay/:seconds`
/// rather than `/delay/17`).
pub async fn track_requests(
    State(metrics): State<SharedMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| endpoint_label(path.as_str()))
        .unwrap_or_else(|| request.uri().path().to_string());

    let _in_flight = metrics.track_in_flight();
    let response = next.run(request).await;

    let status = response.status().as_u16();
    metrics.record_request(&method, &endpoint, status);
    debug!(method = %method, endpoint = %endpoint, status, "Request completed");

    response
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod tests;
