//! Metrics collection and exposition.
//!
//! # Metrics
//! - `echo_requests_total` (counter): requests by method, status
//! - `echo_request_duration_seconds` (histogram): latency by method, status
//! - `echo_generated_status_total` (counter): status-code responses by status
//! - `echo_body_read_failures_total` (counter): bodies captured as empty after a read error
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with a scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("echo_requests_total", "Requests captured, by method and status");
    describe_histogram!(
        "echo_request_duration_seconds",
        "Time from capture to response, by method and status"
    );
    describe_counter!(
        "echo_generated_status_total",
        "Responses generated by the status-code route, by status"
    );
    describe_counter!(
        "echo_body_read_failures_total",
        "Request bodies that could not be read and were captured as empty"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!("echo_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    histogram!("echo_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record a response produced by the status-code route.
pub fn record_generated_status(status: u16) {
    counter!("echo_generated_status_total", "status" => status.to_string()).increment(1);
}

pub fn record_body_read_failure() {
    counter!("echo_body_read_failures_total").increment(1);
}
