//! API error types

use crate::error::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Errors returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request refused by business rules.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Signature rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Provider or store failure.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Human readable message.
    pub error: String,
    /// Machine readable code.
    pub code: String,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => Self::Validation(msg),
            Error::Notification(msg) => Self::BadRequest(msg),
            Error::Signature(msg) => Self::Unauthorized(msg),
            Error::Provider(_) | Error::Store(_) => Self::Upstream(err.to_string()),
            Error::Io(_) | Error::Config(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            Self::Upstream(msg) => {
                warn!("Upstream failure: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg)
            }
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;
