//! HTTP server for simulated probes and artificial latency
//!
//! Provides delayed Kubernetes probes, delay endpoints, a runtime
//! configuration endpoint, and Prometheus metrics.
//!
//! Also provides graceful shutdown handling for SIGTERM/SIGINT.

mod app;
pub mod error;
mod handlers;
pub mod metrics;
pub mod shutdown;

pub use app::{build_router, run_server, serve, ServerState};
pub use error::ApiError;
pub use handlers::{ConfigRequest, Message};
pub use metrics::{create_metrics, InFlightGuard, Metrics, MetricsError, SharedMetrics};
pub use shutdown::{
    shutdown_channel, wait_for_signal, DrainOutcome, ShutdownController, ShutdownCoordinator,
    ShutdownSignal, ShutdownTrigger,
};

#[cfg(test)]
#[path = "app_test.rs"]
mod app_tests;

#[cfg(test)]
#[path = "handlers_test.rs"]
mod handlers_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
