//! Metrics Server Integration Tests
//!
//! Tests for the Prometheus scrape endpoint.

use shopify_upload_relay::metrics;
use shopify_upload_relay::metrics::server::MetricsServer;
use std::time::Duration;

async fn scrape(addr: std::net::SocketAddr) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("http://{}/metrics", addr))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Should connect to metrics server")
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let mut server = MetricsServer::new("127.0.0.1:0");
    let addr = server.start().await.expect("Server should start");

    let response = scrape(addr).await;
    assert!(response.status().is_success());

    let content_type = response
        .headers()
        .get("content-type")
        .expect("Should have content-type")
        .to_str()
        .unwrap()
        .to_string();
    assert!(
        content_type.contains("text/plain"),
        "Content-Type should be Prometheus text format"
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_metrics_include_relay_counters() {
    let mut server = MetricsServer::new("127.0.0.1:0");
    let addr = server.start().await.expect("Server should start");

    metrics::record_upload_success(1024, 0.2);
    metrics::record_upload_failure("bytes_uploaded", "upstream_transport", 0.4);
    metrics::record_upstream_request("staged_uploads_create", "200");
    metrics::record_origin_rejection();

    let body = scrape(addr).await.text().await.unwrap();

    for name in [
        "relay_uploads_total",
        "relay_upload_failures_total",
        "relay_upload_bytes_total",
        "relay_upload_duration_seconds",
        "relay_upstream_requests_total",
        "relay_origin_rejections_total",
    ] {
        assert!(body.contains(name), "missing {}", name);
    }
    assert!(body.contains(r#"stage="bytes_uploaded""#));

    server.shutdown().await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let mut server = MetricsServer::new("127.0.0.1:0");
    let addr = server.start().await.expect("Server should start");

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"{"status":"ok"}"#);

    server.shutdown().await;
}

#[tokio::test]
async fn test_other_paths_not_found() {
    let mut server = MetricsServer::new("127.0.0.1:0");
    let addr = server.start().await.expect("Server should start");

    let response = reqwest::get(format!("http://{}/upload", addr)).await.unwrap();
    assert_eq!(response.status(), 404);

    server.shutdown().await;
}
