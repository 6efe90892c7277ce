//! Unified error handling for HTTP handlers
//!
//! Every error leaves the server as the shared [`ApiResponse`] shape:
//!
//! ```json
//! { "code": 4011, "message": "Invalid ticket transition ready -> ordered: ..." }
//! ```
//!
//! Domain errors keep their code from [`ManagerError`]; transport-level
//! problems (bad JSON, blocking task failures) are mapped here.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::error::{ApiError, ApiResponse, ErrorCode};
use tracing::error;

use crate::orders::ManagerError;

/// Application error
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Structured domain error with its code
    #[error("{0}")]
    Api(ApiError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The structured error sent to the client
    pub fn to_api_error(&self) -> ApiError {
        match self {
            AppError::Api(err) => err.clone(),
            AppError::Validation(msg) => ApiError::with_message(ErrorCode::ValidationFailed, msg),
            AppError::NotFound(msg) => ApiError::with_message(ErrorCode::NotFound, msg),
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                ApiError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.to_api_error();
        (err.http_status(), Json(ApiResponse::error(&err))).into_response()
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        AppError::Api(err.into())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {err}"))
    }
}

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::validation("bad"), StatusCode::BAD_REQUEST),
            (AppError::not_found("gone"), StatusCode::NOT_FOUND),
            (AppError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ManagerError::InvalidTransition("ready -> ordered".into()).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ManagerError::ConcurrencyConflict("o".into()).into(),
                StatusCode::CONFLICT,
            ),
            (
                ManagerError::OrderNotFound("o".into()).into(),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let api = AppError::internal("redb exploded").to_api_error();
        assert_eq!(api.code, ErrorCode::InternalError);
        assert!(!api.message.contains("redb"));
    }
}
