//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dialogues_http_requests_total` (counter): requests by method, status
//! - `dialogues_http_request_duration_seconds` (histogram): latency by method
//! - `dialogues_tasks_total` (counter): task events (submitted, done, failed, evicted)
//! - `dialogues_tasks_tracked` (gauge): tasks currently held by the registry
//! - `dialogues_request_log_failures_total` (counter): log sink writes that failed
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "dialogues_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("dialogues_http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a task lifecycle event.
pub fn record_task_event(event: &'static str) {
    counter!("dialogues_tasks_total", "event" => event).increment(1);
}

/// Report how many tasks the registry holds.
pub fn record_tasks_tracked(count: usize) {
    gauge!("dialogues_tasks_tracked").set(count as f64);
}

/// Record a log sink write that failed or timed out.
pub fn record_log_failure(reason: &'static str) {
    counter!("dialogues_request_log_failures_total", "reason" => reason).increment(1);
}
