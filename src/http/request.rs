//! Request-side helpers.
//!
//! # Responsibilities
//! - Pagination query parameters and their bounds
//! - Request ID header and the per-request tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible (outermost layer) for tracing
//! - Dialogue fields arrive as query parameters, matching the public API

use axum::{body::Body, http::Request};
use serde::Deserialize;
use tracing::Span;

use crate::config::ApiConfig;
use crate::http::error::ApiError;

/// Header carrying the request ID, set by `SetRequestIdLayer`.
pub const X_REQUEST_ID: &str = "x-request-id";

/// `?page=&size=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    /// Resolve to `(page, size)`, applying defaults and bounds.
    pub fn resolve(&self, api: &ApiConfig) -> Result<(u32, u32), ApiError> {
        let page = self.page.unwrap_or(1);
        let size = self.size.unwrap_or(api.default_page_size);

        if page < 1 {
            return Err(ApiError::Validation("page must be >= 1".to_string()));
        }
        if size < 1 || size > api.max_page_size {
            return Err(ApiError::Validation(format!(
                "size must be within 1..={}",
                api.max_page_size
            )));
        }
        Ok((page, size))
    }
}

/// Span for one HTTP request, tagged with its request ID.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let api = ApiConfig::default();
        assert_eq!(PageParams::default().resolve(&api).unwrap(), (1, 50));
    }

    #[test]
    fn test_bounds() {
        let api = ApiConfig::default();
        let zero_page = PageParams { page: Some(0), size: None };
        assert!(matches!(zero_page.resolve(&api), Err(ApiError::Validation(_))));

        let too_big = PageParams { page: None, size: Some(101) };
        assert!(matches!(too_big.resolve(&api), Err(ApiError::Validation(_))));

        let max = PageParams { page: Some(3), size: Some(100) };
        assert_eq!(max.resolve(&api).unwrap(), (3, 100));
    }
}
