//! Metrics module
//!
//! Provides Prometheus metrics for the relay.

pub mod server;

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Histogram,
};

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "relay_uploads_total",
        "Total number of relayed uploads",
        &["outcome"]
    ).unwrap();

    pub static ref UPLOAD_FAILURES: CounterVec = register_counter_vec!(
        "relay_upload_failures_total",
        "Failed uploads by stage reached and error kind",
        &["stage", "kind"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "relay_upload_bytes_total",
        "Total bytes relayed to Shopify"
    ).unwrap();

    pub static ref UPLOAD_DURATION: Histogram = register_histogram!(
        "relay_upload_duration_seconds",
        "End-to-end relay duration in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // Outbound calls
    pub static ref UPSTREAM_REQUESTS: CounterVec = register_counter_vec!(
        "relay_upstream_requests_total",
        "Outbound requests to Shopify and staging targets",
        &["call", "status"]
    ).unwrap();

    // CORS
    pub static ref ORIGIN_REJECTIONS: Counter = register_counter!(
        "relay_origin_rejections_total",
        "Requests blocked by the origin gate"
    ).unwrap();
}

/// Record a successful relay
pub fn record_upload_success(bytes: u64, duration_secs: f64) {
    UPLOADS_TOTAL.with_label_values(&["success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
    UPLOAD_DURATION.observe(duration_secs);
}

/// Record a failed relay
pub fn record_upload_failure(stage: &str, kind: &str, duration_secs: f64) {
    UPLOADS_TOTAL.with_label_values(&["failure"]).inc();
    UPLOAD_FAILURES.with_label_values(&[stage, kind]).inc();
    UPLOAD_DURATION.observe(duration_secs);
}

/// Record an outbound request
///
/// `status` is the HTTP status code, or `"error"` for transport failures.
pub fn record_upstream_request(call: &str, status: &str) {
    UPSTREAM_REQUESTS.with_label_values(&[call, status]).inc();
}

/// Record a request blocked by the origin gate
pub fn record_origin_rejection() {
    ORIGIN_REJECTIONS.inc();
}
