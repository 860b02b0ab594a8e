//! Custom error types for the catalog service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{jwt::AuthError, validation::ValidationErrors};

/// Error returned by every handler
///
/// The message is shown to the client as is, so storage failures must be
/// logged and replaced by a generic message before they get here.
#[derive(Error, Debug)]
pub enum ApiError {
    /// One or more request fields are missing or invalid
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// The request body could not be read
    #[error("{0}")]
    BadRequest(String),

    /// Bad credentials, or a missing, invalid, expired or revoked token
    #[error("{0}")]
    Unauthorized(String),

    /// No matching record
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation or an invalid state
    #[error("{0}")]
    Conflict(String),

    /// Storage or unexpected failure
    #[error("{0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        ApiError::Unauthorized(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ApiError::Validation(errors) => json!({
                "message": errors.to_string(),
                "errors": errors.fields(),
            }),
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
