//! Unified error system for the tiffin marketplace core
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details,
//!   rendered as a JSON error response
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication and one-time code errors
//! - 4xxx: Order errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::InvalidStateTransition)
//!     .with_detail("status", "CANCELLED");
//!
//! assert_eq!(err.code.code(), 4101);
//! assert_eq!(err.http_status(), shared::http::StatusCode::CONFLICT);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult, RETRY_AFTER_DETAIL};
