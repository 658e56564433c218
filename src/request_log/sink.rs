//! Log sink implementations.

use async_trait::async_trait;
use sqlx::AnyPool;
use thiserror::Error;

/// One row of the `logs` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Service tag, constant per process.
    pub microservice: String,
    /// Request path.
    pub request: String,
    /// Response status code, as a decimal string.
    pub response: String,
    /// Whole seconds spent producing the response (truncated).
    pub elapsed: i64,
}

/// Errors raised by a sink. The middleware logs and drops them.
#[derive(Debug, Error)]
pub enum LogSinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("sink write timed out after {0} ms")]
    Timeout(u64),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for per-request log entries.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn record(&self, entry: LogEntry) -> Result<(), LogSinkError>;
}

/// Appends entries to the `logs` table.
pub struct SqlLogSink {
    pool: AnyPool,
}

impl SqlLogSink {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogSink for SqlLogSink {
    async fn record(&self, entry: LogEntry) -> Result<(), LogSinkError> {
        sqlx::query("INSERT INTO logs (microservice, request, response, elapsed) VALUES (?, ?, ?, ?)")
            .bind(entry.microservice)
            .bind(entry.request)
            .bind(entry.response)
            .bind(entry.elapsed)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Emits entries as tracing events; never fails.
pub struct TracingLogSink;

#[async_trait]
impl LogSink for TracingLogSink {
    async fn record(&self, entry: LogEntry) -> Result<(), LogSinkError> {
        tracing::info!(
            target: "dialogues_service::request_log",
            microservice = %entry.microservice,
            request = %entry.request,
            response = %entry.response,
            elapsed = entry.elapsed,
            "Request logged"
        );
        Ok(())
    }
}
