//! Tests for the metrics recorder

use super::*;

#[test]
fn test_metrics_new_registers_collectors() {
    let metrics = Metrics::new().expect("metrics should register");
    metrics.record_request("GET", "/startup", 200);

    let text = metrics.encode().expect("encode should succeed");

    assert!(text.contains("active_requests"));
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("prober_build_info"));
    assert!(text.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_separate_instances_do_not_share_counts() {
    let first = Metrics::new().expect("metrics should register");
    let second = Metrics::new().expect("metrics should register");

    first.record_request("GET", "/delay/:seconds", 200);

    assert_eq!(first.request_count("GET", "/delay/:seconds", 200), 1);
    assert_eq!(second.request_count("GET", "/delay/:seconds", 200), 0);
}

#[test]
fn test_in_flight_guard_increments_and_decrements() {
    let metrics = Metrics::new().expect("metrics should register");
    assert_eq!(metrics.active_requests(), 0);

    let first = metrics.track_in_flight();
    let second = metrics.track_in_flight();
    assert_eq!(metrics.active_requests(), 2);

    drop(first);
    assert_eq!(metrics.active_requests(), 1);

    drop(second);
    assert_eq!(metrics.active_requests(), 0);
}

#[test]
fn test_record_request_labels() {
    let metrics = Metrics::new().expect("metrics should register");

    metrics.record_request("POST", "/config", 201);
    metrics.record_request("POST", "/config", 201);
    metrics.record_request("POST", "/config", 400);

    assert_eq!(metrics.request_count("POST", "/config", 201), 2);
    assert_eq!(metrics.request_count("POST", "/config", 400), 1);

    let text = metrics.encode().expect("encode should succeed");
    assert!(text.contains(r#"statusCode="201""#));
    assert!(text.contains(r#"endpoint="/config""#));
    assert!(text.contains(r#"method="POST""#));
}

#[test]
fn test_concurrent_updates_are_not_lost() {
    let metrics = create_metrics().expect("metrics should register");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let metrics = metrics.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    let _guard = metrics.track_in_flight();
                    metrics.record_request("GET", "/delay/:seconds", 200);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    assert_eq!(metrics.request_count("GET", "/delay/:seconds", 200), 2000);
    assert_eq!(metrics.active_requests(), 0);
}

#[test]
fn test_endpoint_label_uses_colon_parameters() {
    assert_eq!(endpoint_label("/delay/{seconds}"), "/delay/:seconds");
    assert_eq!(endpoint_label("/graceDelay/{seconds}"), "/graceDelay/:seconds");
    assert_eq!(endpoint_label("/config"), "/config");
    assert_eq!(endpoint_label("/"), "/");
}
