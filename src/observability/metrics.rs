//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define route table metrics (refresh cycles, source failures, lookups)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `route_refresh_cycles_total` (counter): cycles by outcome
//! - `route_refresh_duration_seconds` (histogram): fetch-to-publish time
//! - `route_source_failures_total` (counter): by origin, kind
//! - `route_malformed_records_total` (counter): skipped rows by origin
//! - `route_table_size` (gauge): routes in the published table
//! - `route_resolutions_total` (counter): lookups by result
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter
//! - Labels are low-cardinality (origin, outcome), never request paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_refresh_cycle(outcome: &'static str, started: Instant) {
    metrics::counter!("route_refresh_cycles_total", "outcome" => outcome).increment(1);
    metrics::histogram!("route_refresh_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_source_failure(origin: &str, kind: &'static str) {
    metrics::counter!(
        "route_source_failures_total",
        "origin" => origin.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_malformed_records(origin: &str, count: usize) {
    metrics::counter!("route_malformed_records_total", "origin" => origin.to_string())
        .increment(count as u64);
}

pub fn record_table_size(size: usize) {
    metrics::gauge!("route_table_size").set(size as f64);
}

pub fn record_resolution(matched: bool) {
    let result = if matched { "matched" } else { "not_found" };
    metrics::counter!("route_resolutions_total", "result" => result).increment(1);
}
