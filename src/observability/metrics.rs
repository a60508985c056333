//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): requests by operation, outcome
//! - `bridge_request_duration_seconds` (histogram): latency by operation
//! - `bridge_retries_total` (counter): transport-level retries by operation
//! - `submission_outcomes_total` (counter): confirmed / failed / retried jobs
//! - `submission_duplicates_total` (counter): dispatches dropped by the lease
//! - `cache_lookups_total` (counter): hit / miss
//! - `cache_invalidations_total` (counter): full / selective
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_bridge_request(operation: &'static str, outcome: &'static str, started: Instant) {
    ::metrics::counter!("bridge_requests_total", "operation" => operation, "outcome" => outcome).increment(1);
    ::metrics::histogram!("bridge_request_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_bridge_retry(operation: &'static str) {
    ::metrics::counter!("bridge_retries_total", "operation" => operation).increment(1);
}

pub fn record_submission_outcome(outcome: &'static str) {
    ::metrics::counter!("submission_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_duplicate_dispatch() {
    ::metrics::counter!("submission_duplicates_total").increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!("cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_invalidation(mode: &'static str, keys: usize) {
    ::metrics::counter!("cache_invalidations_total", "mode" => mode).increment(1);
    ::metrics::counter!("cache_invalidated_keys_total", "mode" => mode).increment(keys as u64);
}
