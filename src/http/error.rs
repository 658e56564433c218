//! API error type and its HTTP mapping.
//!
//! | Variant        | Status |
//! |----------------|--------|
//! | `NotFound`     | 404    |
//! | `EmptyResult`  | 400    |
//! | `UnknownTask`  | 404    |
//! | `Validation`   | 422    |
//! | `Store`        | 500    |
//!
//! Bodies are `{"detail": "<message>"}`. Driver errors are logged, never sent.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{DialogueFilter, StoreError};

/// Error body returned to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("dialogue id {0} not found")]
    NotFound(i64),

    #[error("{}", empty_result_detail(.0))]
    EmptyResult(DialogueFilter),

    #[error("task id {0} not found")]
    UnknownTask(String),

    #[error("{0}")]
    Validation(String),

    #[error("internal database error")]
    Store(#[source] StoreError),
}

fn empty_result_detail(filter: &DialogueFilter) -> &'static str {
    match filter {
        DialogueFilter::All => "bad request to dialogues table",
        DialogueFilter::User(_) => "user id not found",
        DialogueFilter::Conversation(_) => "conversation id not found",
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::UnknownTask(_) => StatusCode::NOT_FOUND,
            ApiError::EmptyResult(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => ApiError::NotFound(id),
            StoreError::EmptyResult { filter } => ApiError::EmptyResult(filter),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(source) = &self {
            tracing::error!(error = %source, "Store operation failed");
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
