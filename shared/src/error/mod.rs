//! Unified error system
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ApiError`]: Structured error (kind + human message)
//! - [`ApiResponse`]: Unified API response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Menu / inventory errors
//! - 9xxx: System errors

mod codes;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiError, ApiResponse};
