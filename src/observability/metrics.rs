//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ssn_requests_total` (counter): responses by status code
//! - `ssn_request_duration_seconds` (histogram): latency from admission to response
//! - `ssn_validations_total` (counter): verdicts by outcome
//! - `ssn_rate_limited_total` (counter): denied admissions
//! - `ssn_rate_limit_tracked_keys` (gauge): clients holding a bucket
//!
//! All recorders are no-ops until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    counter!("ssn_requests_total", "status" => status.to_string()).increment(1);
    histogram!("ssn_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_validation(valid: bool) {
    let outcome = if valid { "valid" } else { "invalid" };
    counter!("ssn_validations_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited() {
    counter!("ssn_rate_limited_total").increment(1);
}

pub fn record_tracked_keys(count: usize) {
    gauge!("ssn_rate_limit_tracked_keys").set(count as f64);
}
