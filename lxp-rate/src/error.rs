//! Error types for lxp-rate

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::SessionError;
use crate::services::{ProfileError, RecordError};
use crate::sinks::SinkError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or wrong admin PIN (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// lxp-common error
    #[error("Common error: {0}")]
    Common(#[from] lxp_common::Error),

    /// Rejected session transition (409)
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Record could not be built from the session (409)
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Profile answers rejected (400)
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Local sink failure (500)
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Common(err) => match err {
                lxp_common::Error::Config(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "CONFIGURATION_ERROR")
                }
                lxp_common::Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                lxp_common::Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                lxp_common::Error::Io(_) | lxp_common::Error::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR")
                }
            },
            ApiError::Session(_) => (StatusCode::CONFLICT, "SESSION_STATE"),
            // Out-of-range values are rejected when rated, so reaching the
            // builder with one is a server fault
            ApiError::Record(RecordError::OutOfRange(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            ApiError::Record(_) => (StatusCode::CONFLICT, "SESSION_STATE"),
            ApiError::Profile(_) => (StatusCode::BAD_REQUEST, "INVALID_PROFILE"),
            ApiError::Sink(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SINK_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        let message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg) => msg.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    /// Malformed or mistyped request bodies answer 400 in the error envelope
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
