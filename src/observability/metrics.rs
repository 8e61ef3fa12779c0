//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, lookups, auth, upstream)
//! - Expose a Prometheus-compatible scrape endpoint
//! - Track per-service health as gauges
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_route_lookups_total` (counter): resolver outcomes
//! - `gateway_route_cache_entries` (gauge): memoized prefix resolutions
//! - `gateway_auth_failures_total` (counter): rejections by reason
//! - `gateway_upstream_errors_total` (counter): forwarding failures by kind
//! - `gateway_service_health` (gauge): 1=healthy, 0=unhealthy
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library code and
//!   tests call these functions unconditionally
//! - Labels carry service names, never raw paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("service", service.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// `outcome` is one of `exact`, `cached`, `prefix`, `miss`.
pub fn record_route_lookup(outcome: &'static str) {
    counter!("gateway_route_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_route_cache_size(entries: usize) {
    gauge!("gateway_route_cache_entries").set(entries as f64);
}

pub fn record_auth_failure(reason: &'static str) {
    counter!("gateway_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_upstream_error(kind: &'static str, service: &str) {
    counter!(
        "gateway_upstream_errors_total",
        "kind" => kind,
        "service" => service.to_string()
    )
    .increment(1);
}

pub fn record_service_health(service: &str, healthy: bool) {
    gauge!("gateway_service_health", "service" => service.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
