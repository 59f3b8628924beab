//! prober: a controllable target for exercising Kubernetes probe timeouts,
//! rollouts, and graceful-shutdown draining.
//!
//! - [`delays`] - process-wide, reconfigurable probe delays
//! - [`config`] - server settings read from the environment
//! - [`server`] - HTTP endpoints, metrics, and shutdown coordination

pub mod config;
pub mod delays;
pub mod server;
