//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): by method, status, outcome
//! - `gateway_request_duration_seconds` (histogram): by outcome
//! - `gateway_identity_lookups_total` (counter): by result
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::http::response::ProxyOutcome;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Label value for a request method. Extension methods collapse to `other`
/// so clients cannot mint new series.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        Method::CONNECT => "CONNECT",
        Method::TRACE => "TRACE",
        _ => "other",
    }
}

pub fn record_request(method: &Method, status: u16, outcome: ProxyOutcome, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method_label(method),
        "status" => status.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "outcome" => outcome.as_str()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_identity_lookup(result: &'static str) {
    metrics::counter!("gateway_identity_lookups_total", "result" => result).increment(1);
}
