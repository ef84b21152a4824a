//! Prometheus metrics for request and store latency tracking.
//!
//! This module provides metrics for:
//! - HTTP request count and latency per route
//! - Store call latency and failures per operation
//! - Dropped access events

use std::sync::OnceLock;
use std::time::Instant;

use axum::http::StatusCode;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::store::StoreOperation;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Store call latency metric name.
pub const METRIC_STORE_LATENCY: &str = "store_call_latency_ms";
/// Store failures counter metric name.
pub const METRIC_STORE_FAILURES: &str = "store_failures_total";
/// Dropped access events counter metric name.
pub const METRIC_ACCESS_EVENTS_DROPPED: &str = "access_events_dropped_total";

static PROMETHEUS_HANDLE: OnceLock<Result<PrometheusHandle, String>> = OnceLock::new();

/// Install the Prometheus recorder and register metric descriptions.
///
/// Safe to call more than once; later calls return the outcome of the first.
pub fn init_metrics() -> Result<PrometheusHandle, String> {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| format!("failed to install prometheus recorder: {e}"))?;

            describe_histogram!(
                METRIC_HTTP_REQUEST_LATENCY,
                "HTTP request latency in milliseconds"
            );
            describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests");
            describe_histogram!(
                METRIC_STORE_LATENCY,
                "Data store call latency in milliseconds"
            );
            describe_counter!(
                METRIC_STORE_FAILURES,
                "Total number of failed data store calls"
            );
            describe_counter!(
                METRIC_ACCESS_EVENTS_DROPPED,
                "Total number of access events dropped before delivery"
            );

            debug!("Metrics initialized");
            Ok(handle)
        })
        .clone()
}

/// Returns the global Prometheus handle, if initialized.
pub fn prometheus_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get()
        .and_then(|installed| installed.as_ref().ok().cloned())
}

/// Record HTTP request latency and count.
pub fn record_http_request(start: Instant, route: &str, method: &str, status: StatusCode) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let labels = [
        ("route", route.to_string()),
        ("method", method.to_string()),
        ("status_class", status_class(status).to_string()),
    ];
    histogram!(METRIC_HTTP_REQUEST_LATENCY, &labels).record(latency_ms);
    counter!(METRIC_HTTP_REQUESTS, &labels).increment(1);
}

/// Record store call latency.
pub fn record_store_latency(start: Instant, operation: StoreOperation) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let label: &'static str = operation.into();
    histogram!(METRIC_STORE_LATENCY, "operation" => label).record(latency_ms);
}

/// Increment store failures counter.
pub fn inc_store_failures(operation: StoreOperation) {
    let label: &'static str = operation.into();
    counter!(METRIC_STORE_FAILURES, "operation" => label).increment(1);
}

/// Increment dropped access events counter.
pub fn inc_access_events_dropped() {
    counter!(METRIC_ACCESS_EVENTS_DROPPED).increment(1);
}

/// Returns the status class (2xx, 3xx, 4xx, 5xx) for a status code.
pub fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "unknown",
    }
}
