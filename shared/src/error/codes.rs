//! Unified error codes for the tiffin marketplace core
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication and one-time code errors
//! - 4xxx: Order errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,

    // ==================== 1xxx: Auth ====================
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 11xx: One-time codes ====================
    /// Too many code requests in the current window
    RateLimited = 1101,
    /// Too many verification attempts for the live code
    TooManyAttempts = 1102,
    /// No live code for the subject (expired, consumed or never issued)
    VerificationCodeExpired = 1103,
    /// Submitted code does not match the live code
    VerificationCodeInvalid = 1104,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4007,
    /// Operation is not valid from the current order status
    InvalidStateTransition = 4101,
    /// Order code is malformed
    OrderCodeInvalid = 4102,
    /// Order code collided with an existing order in the same partition
    OrderCodeConflict = 4103,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Key/value cache unreachable
    StoreUnavailable = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether the caller may retry the same request later without changing it
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::RateLimited
                | ErrorCode::TimeoutError
                | ErrorCode::StoreUnavailable
                | ErrorCode::DatabaseError
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",

            // Auth
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // One-time codes
            ErrorCode::RateLimited => "Too many requests, try again later",
            ErrorCode::TooManyAttempts => "Too many attempts, request a new code",
            ErrorCode::VerificationCodeExpired => "Verification code expired or not found",
            ErrorCode::VerificationCodeInvalid => "Verification code is invalid",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::InvalidStateTransition => "Operation not allowed in current order status",
            ErrorCode::OrderCodeInvalid => "Order code is malformed",
            ErrorCode::OrderCodeConflict => "Order code already in use",

            // System
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::StoreUnavailable => "Code store unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),

            // Auth
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // One-time codes
            1101 => Ok(ErrorCode::RateLimited),
            1102 => Ok(ErrorCode::TooManyAttempts),
            1103 => Ok(ErrorCode::VerificationCodeExpired),
            1104 => Ok(ErrorCode::VerificationCodeInvalid),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4101 => Ok(ErrorCode::InvalidStateTransition),
            4102 => Ok(ErrorCode::OrderCodeInvalid),
            4103 => Ok(ErrorCode::OrderCodeConflict),

            // System
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9006 => Ok(ErrorCode::StoreUnavailable),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::RateLimited.code(), 1101);
        assert_eq!(ErrorCode::TooManyAttempts.code(), 1102);
        assert_eq!(ErrorCode::VerificationCodeExpired.code(), 1103);
        assert_eq!(ErrorCode::VerificationCodeInvalid.code(), 1104);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::InvalidStateTransition.code(), 4101);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
        assert_eq!(ErrorCode::StoreUnavailable.code(), 9006);
    }

    #[test]
    fn test_try_from_covers_every_variant() {
        let all = [
            ErrorCode::ValidationFailed,
            ErrorCode::TokenExpired,
            ErrorCode::TokenInvalid,
            ErrorCode::RateLimited,
            ErrorCode::TooManyAttempts,
            ErrorCode::VerificationCodeExpired,
            ErrorCode::VerificationCodeInvalid,
            ErrorCode::OrderNotFound,
            ErrorCode::OrderEmpty,
            ErrorCode::InvalidStateTransition,
            ErrorCode::OrderCodeInvalid,
            ErrorCode::OrderCodeConflict,
            ErrorCode::DatabaseError,
            ErrorCode::TimeoutError,
            ErrorCode::StoreUnavailable,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(9001), Err(InvalidErrorCode(9001)));
        assert_eq!(ErrorCode::try_from(3013), Err(InvalidErrorCode(3013)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::RateLimited).unwrap(), "1101");
        let code: ErrorCode = serde_json::from_str("4101").unwrap();
        assert_eq!(code, ErrorCode::InvalidStateTransition);
        assert!(serde_json::from_str::<ErrorCode>("999").is_err());
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::RateLimited.is_retryable());
        assert!(ErrorCode::StoreUnavailable.is_retryable());
        assert!(!ErrorCode::VerificationCodeInvalid.is_retryable());
        assert!(!ErrorCode::InvalidStateTransition.is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(format!("{}", InvalidErrorCode(7)), "invalid error code: 7");
    }
}
