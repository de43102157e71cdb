//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests handled by a tenant, by tenant, method, status
//! - `gateway_request_duration_seconds` (histogram): tenant latency, by tenant
//! - `gateway_blocked_requests_total` (counter): access filter rejections
//! - `gateway_unmatched_host_total` (counter): requests for unknown hosts
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(tenant: &str, method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "tenant" => tenant.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "tenant" => tenant.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_blocked() {
    counter!("gateway_blocked_requests_total").increment(1);
}

pub fn record_unmatched_host() {
    counter!("gateway_unmatched_host_total").increment(1);
}
