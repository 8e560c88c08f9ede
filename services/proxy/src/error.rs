//! Custom error types for the proxy service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the proxy service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with the current state of a job or object
    #[error("{0}")]
    Conflict(String),

    /// An upstream engine answered with an error
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Object storage rejected the upload
    #[error("Failed to upload video: {0}")]
    Storage(String),

    /// A credential the route needs is missing
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// History routes called without a database
    #[error("History is not enabled")]
    HistoryDisabled,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::HistoryDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_)
            | ApiError::NotConfigured(_)
            | ApiError::InternalServerError
            | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ApiError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
