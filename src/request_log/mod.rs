//! Per-request logging.
//!
//! Every request handled by the service leaves one [`LogEntry`]
//! (service tag, path, status, elapsed seconds). Entries go to a [`LogSink`];
//! the HTTP middleware in `http::middleware::request_log` drives it.
//!
//! Sinks are pluggable so a slow or broken log store can never change a
//! client-visible response.

pub mod sink;

use std::sync::Arc;

use sqlx::AnyPool;

use crate::config::LogSinkKind;

pub use sink::{LogEntry, LogSink, LogSinkError, SqlLogSink, TracingLogSink};

/// Build the sink selected in config.
pub fn build_sink(kind: LogSinkKind, pool: &AnyPool) -> Arc<dyn LogSink> {
    match kind {
        LogSinkKind::Database => Arc::new(SqlLogSink::new(pool.clone())),
        LogSinkKind::Tracing => Arc::new(TracingLogSink),
    }
}
