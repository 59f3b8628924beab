//! Tests for the shutdown-aware delay loop
//!
//! Run on a paused clock so whole-second ticks complete instantly.

use super::handlers::{sleep_until_drained, GRACE_TICK};
use super::shutdown::shutdown_channel;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_zero_steps_returns_immediately() {
    let (controller, signal) = shutdown_channel();
    controller.shutdown();
    let start = Instant::now();

    let elapsed = sleep_until_drained(0, &signal, GRACE_TICK).await;

    assert_eq!(elapsed, 0);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_runs_all_steps_without_shutdown() {
    let (_controller, signal) = shutdown_channel();
    let start = Instant::now();

    let elapsed = sleep_until_drained(3, &signal, GRACE_TICK).await;

    assert_eq!(elapsed, 3);
    assert!(start.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_already_draining_still_counts_first_second() {
    let (controller, signal) = shutdown_channel();
    controller.shutdown();
    let start = Instant::now();

    let elapsed = sleep_until_drained(5, &signal, GRACE_TICK).await;

    assert_eq!(elapsed, 1);
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_tick_counts_the_tick_in_progress() {
    let (controller, signal) = shutdown_channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        controller.shutdown();
    });
    let start = Instant::now();

    let elapsed = sleep_until_drained(10, &signal, GRACE_TICK).await;

    // Drain seen at the 3s check: three full seconds slept
    assert_eq!(elapsed, 3);
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_half_second_in_reports_one() {
    let (controller, signal) = shutdown_channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        controller.shutdown();
    });

    let elapsed = sleep_until_drained(2, &signal, GRACE_TICK).await;

    assert_eq!(elapsed, 1);
}

#[test]
fn test_config_request_decodes_missing_and_null_as_empty() {
    use super::handlers::ConfigRequest;

    let request = ConfigRequest::from_json(br#"{"startup":"5","readiness":null}"#)
        .expect("null and missing fields are accepted");

    assert_eq!(
        request,
        ConfigRequest {
            startup: "5".to_string(),
            readiness: String::new(),
            liveness: String::new(),
        }
    );
    assert_eq!(
        ConfigRequest::from_json(b"null").expect("null body is accepted"),
        ConfigRequest::default()
    );
}

#[test]
fn test_config_request_rejects_malformed_bodies() {
    use super::handlers::ConfigRequest;

    let bodies: [&[u8]; 5] = [b"", b"{", b"not json", br#"{"startup":5}"#, b"\"5\""];
    for body in bodies {
        assert!(
            ConfigRequest::from_json(body).is_err(),
            "{:?} should be rejected",
            String::from_utf8_lossy(body)
        );
    }
}
