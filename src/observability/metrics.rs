//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency by method
//! - `gateway_stream_events_total` (counter): events published by stream
//! - `gateway_stream_subscribers` (gauge): open subscriptions by stream,
//!   sampled on subscribe and publish, zeroed when the stream is removed.
//!   A disconnect shows up at the next subscribe or publish on that stream.
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus scrape endpoint on its own listener

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, latency: Duration) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_stream_event(stream: &str) {
    counter!("gateway_stream_events_total", "stream" => stream.to_string()).increment(1);
}

pub fn record_subscribers(stream: &str, count: usize) {
    gauge!("gateway_stream_subscribers", "stream" => stream.to_string()).set(count as f64);
}
