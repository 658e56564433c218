//! Request logging middleware.
//! Writes one log entry per request after the response exists.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;
use crate::request_log::{LogEntry, LogSink, LogSinkError};

/// Middleware state: where entries go and how they are tagged.
#[derive(Clone)]
pub struct RequestLogger {
    sink: Arc<dyn LogSink>,
    microservice: Arc<str>,
    timeout: Duration,
}

impl RequestLogger {
    pub fn new(sink: Arc<dyn LogSink>, microservice: &str, timeout: Duration) -> Self {
        Self {
            sink,
            microservice: Arc::from(microservice),
            timeout,
        }
    }

    /// Hand the entry to the sink. Never fails; problems are logged.
    async fn write(&self, entry: LogEntry) {
        let sink = Arc::clone(&self.sink);
        // Own task: a panicking sink or a dropped client connection cannot cut the write short.
        let write = tokio::spawn(async move { sink.record(entry).await });

        let failure = match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(Ok(()))) => return,
            Ok(Ok(Err(e))) => ("error", e),
            Ok(Err(join_err)) => ("panic", LogSinkError::Unavailable(join_err.to_string())),
            Err(_) => (
                "timeout",
                LogSinkError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)),
            ),
        };

        let (reason, error) = failure;
        tracing::warn!(error = %error, reason, "Request log write failed");
        metrics::record_log_failure(reason);
    }
}

/// Time the inner service, then record `(service, path, status, elapsed)`.
/// The response passes through untouched whatever the sink does.
pub async fn request_log_middleware(
    State(logger): State<RequestLogger>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();
    let method = request.method().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    metrics::record_request(&method, status, start);

    let entry = LogEntry {
        microservice: logger.microservice.to_string(),
        request: path,
        response: status.to_string(),
        elapsed: i64::try_from(start.elapsed().as_secs()).unwrap_or(i64::MAX),
    };
    logger.write(entry).await;

    response
}
