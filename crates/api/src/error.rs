//! Error types for the HTTP boundary

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bruteguard_core::{ServiceError, StorageError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Result type for handler operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// External error taxonomy.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCidr(cidr) => {
                ApiError::InvalidArgument(format!("invalid CIDR: {cidr:?}"))
            }
            ServiceError::SubnetNotFound => ApiError::NotFound("subnet not found".to_string()),
            ServiceError::Storage(StorageError::Unavailable(source)) => {
                ApiError::Unavailable(source.to_string())
            }
            ServiceError::Storage(other) => ApiError::Internal(other.to_string()),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
