//! Exporter error types and conversions

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Exporter result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// The database under test did not answer
    Unavailable(String),

    /// Internal server error
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, error_message).into_response()
    }
}

impl From<crate::backend::BackendError> for ApiError {
    fn from(err: crate::backend::BackendError) -> Self {
        ApiError::Unavailable(err.to_string())
    }
}

impl From<crate::metrics::MetricsError> for ApiError {
    fn from(err: crate::metrics::MetricsError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
