//! Utilities - HTTP error type and logging
//!
//! - [`AppError`] - handler error rendered as the shared `ApiResponse`
//! - [`logger`] - tracing subscriber setup

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult, ok};
pub use shared::error::{ApiError, ApiResponse, ErrorCode};
