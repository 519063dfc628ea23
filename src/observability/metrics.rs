//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): served requests by method, status
//! - `router_request_duration_seconds` (histogram): end-to-end latency
//! - `router_match_duration_seconds` (histogram): time spent matching
//! - `router_not_found_total` (counter): requests no route matched
//! - `router_dispatch_errors_total` (counter): dispatch failures by kind
//! - `router_routes_registered` (gauge): routes in the active router
//! - `router_config_reloads_total` (counter): reloads by result
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so the library
//!   and its tests never need one
//! - Prometheus exposition only in the server binary

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, started: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    ::metrics::counter!("router_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    ::metrics::histogram!("router_request_duration_seconds", "method" => method, "status" => status)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_match_duration(started: Instant) {
    ::metrics::histogram!("router_match_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_not_found() {
    ::metrics::counter!("router_not_found_total").increment(1);
}

pub fn record_dispatch_error(kind: &'static str) {
    ::metrics::counter!("router_dispatch_errors_total", "kind" => kind).increment(1);
}

pub fn record_routes_registered(count: usize) {
    ::metrics::gauge!("router_routes_registered").set(count as f64);
}

pub fn record_config_reload(result: &'static str) {
    ::metrics::counter!("router_config_reloads_total", "result" => result).increment(1);
}
