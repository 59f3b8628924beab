//! Server settings read from the environment
//!
//! - `PROBER_PORT` - listen port (default 8080)
//! - `PROBER_SHUTDOWN_TIMEOUT_SECS` - how long draining may take before
//!   open connections are force-closed (default 260)
//!
//! Probe delays have their own variables, see [`crate::delays`].

use std::time::Duration;
use tracing::warn;

/// Environment variable for the HTTP listen port
pub const PORT_ENV: &str = "PROBER_PORT";

/// Environment variable for the drain timeout in seconds
pub const SHUTDOWN_TIMEOUT_ENV: &str = "PROBER_SHUTDOWN_TIMEOUT_SECS";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default bound on draining in-flight requests
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(260);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup
    ///
    /// Unparsable values fall back to the default and are logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or_default(&lookup, PORT_ENV, DEFAULT_PORT);
        let shutdown_timeout = parse_or_default(
            &lookup,
            SHUTDOWN_TIMEOUT_ENV,
            DEFAULT_SHUTDOWN_TIMEOUT.as_secs(),
        );

        Self {
            port,
            shutdown_timeout: Duration::from_secs(shutdown_timeout),
        }
    }
}

fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    env = name,
                    value = %raw,
                    error = %e,
                    default = %default,
                    "Invalid setting, using default"
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
