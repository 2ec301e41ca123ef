//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, profile
//! - `proxy_request_duration_seconds` (histogram): time until the response head
//! - `proxy_upstream_errors_total` (counter): pipeline failures by kind

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, profile: &str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "profile" => profile.to_string()
    )
    .increment(1);

    metrics::histogram!("proxy_request_duration_seconds", "profile" => profile.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a request that failed before its response could be relayed.
pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}
