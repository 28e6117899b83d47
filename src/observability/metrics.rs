//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): requests by outcome
//! - `lb_request_duration_seconds` (histogram): latency by outcome
//! - `lb_backend_live` (gauge): 1=live, 0=dead, per backend
//! - `lb_live_backends` (gauge): size of the published live set
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, start: Instant) {
    ::metrics::counter!("lb_requests_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("lb_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_liveness(backend: &str, live: bool) {
    let value = if live { 1.0 } else { 0.0 };
    ::metrics::gauge!("lb_backend_live", "backend" => backend.to_string()).set(value);
}

pub fn record_live_set(size: usize) {
    ::metrics::gauge!("lb_live_backends").set(size as f64);
}
