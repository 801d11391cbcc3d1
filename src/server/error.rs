//! Dev Backend Error Types
//!
//! Defines error types for the dev backend and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::feed::EventError;

/// Dev backend error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Published event failed validation
    #[error("Invalid event: {0}")]
    Event(#[from] EventError),

    /// Posts fixture could not be parsed
    #[error("Invalid fixture: {0}")]
    Fixture(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::Event(EventError::UnknownKind(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_EVENT")
            }
            ServerError::Event(_) => (StatusCode::BAD_REQUEST, "INVALID_EVENT"),
            ServerError::Fixture(_) => (StatusCode::INTERNAL_SERVER_ERROR, "FIXTURE_ERROR"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request failed"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for dev backend handlers
pub type ServerResult<T> = Result<T, ServerError>;
