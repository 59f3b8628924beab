//! Tests for server settings

use super::*;
use std::time::Duration;

#[test]
fn test_defaults_when_unset() {
    let config = ServerConfig::from_lookup(|_| None);

    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.port, 8080);
    assert_eq!(config.shutdown_timeout, Duration::from_secs(260));
}

#[test]
fn test_overrides_are_parsed() {
    let config = ServerConfig::from_lookup(|name| match name {
        PORT_ENV => Some("9090".to_string()),
        SHUTDOWN_TIMEOUT_ENV => Some(" 30 ".to_string()),
        _ => None,
    });

    assert_eq!(config.port, 9090);
    assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
}

#[test]
fn test_invalid_values_fall_back_to_defaults() {
    let config = ServerConfig::from_lookup(|name| match name {
        PORT_ENV => Some("70000".to_string()),
        SHUTDOWN_TIMEOUT_ENV => Some("forever".to_string()),
        _ => None,
    });

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
}
