//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::OrderNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::InvalidStateTransition | Self::OrderCodeConflict => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::TokenExpired | Self::TokenInvalid | Self::VerificationCodeInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 410 Gone (code must be re-requested)
            Self::VerificationCodeExpired => StatusCode::GONE,

            // 429 Too Many Requests
            Self::RateLimited | Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::TimeoutError | Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed | Self::OrderEmpty | Self::OrderCodeInvalid => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}
