//! Conversions from module errors into the API-layer [`AppError`]
//!
//! Business-rule errors pass through with their own [`ErrorCode`].
//! Infrastructure errors (database, TTL store, timeouts) are logged here at
//! `error!` and surface to clients without internal detail.

use shared::error::{AppError, ErrorCode};

use crate::auth::SessionError;
use crate::events::EventStorageError;
use crate::orders::{OrderError, OrderStoreError, PartitionError};
use crate::otp::OtpError;
use crate::ttl::TtlStoreError;
use crate::util::ceil_secs;

impl From<TtlStoreError> for AppError {
    fn from(e: TtlStoreError) -> Self {
        tracing::error!(error = %e, "TTL store error");
        match e {
            TtlStoreError::Timeout(_) => AppError::new(ErrorCode::TimeoutError),
            TtlStoreError::Database(_) | TtlStoreError::Unavailable(_) => {
                AppError::new(ErrorCode::StoreUnavailable)
            }
        }
    }
}

impl From<OtpError> for AppError {
    fn from(e: OtpError) -> Self {
        match e {
            OtpError::RateLimited { retry_after } => AppError::rate_limited(ceil_secs(retry_after)),
            OtpError::TooManyAttempts => AppError::new(ErrorCode::TooManyAttempts),
            OtpError::CodeExpiredOrNotFound => AppError::new(ErrorCode::VerificationCodeExpired),
            OtpError::InvalidCode => AppError::new(ErrorCode::VerificationCodeInvalid),
            OtpError::Store(store) => store.into(),
        }
    }
}

impl From<OrderStoreError> for AppError {
    fn from(e: OrderStoreError) -> Self {
        tracing::error!(error = %e, "Order store error");
        match e {
            OrderStoreError::Timeout(_) => AppError::new(ErrorCode::TimeoutError),
            OrderStoreError::CodeConflict(_) => AppError::new(ErrorCode::OrderCodeConflict),
            OrderStoreError::ReceiptMismatch { .. } => {
                AppError::new(ErrorCode::VerificationCodeInvalid)
            }
            OrderStoreError::Database(_)
            | OrderStoreError::Serialization(_)
            | OrderStoreError::CorruptRow { .. } => AppError::new(ErrorCode::DatabaseError),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::Empty => AppError::new(ErrorCode::OrderEmpty),
            OrderError::NotFound(id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order", id)
            }
            OrderError::InvalidStateTransition {
                order_id,
                current,
                target,
            } => AppError::with_message(
                ErrorCode::InvalidStateTransition,
                format!("Order cannot move from {current} to {target}"),
            )
            .with_detail("order_id", order_id)
            .with_detail("current", current.as_db())
            .with_detail("target", target.as_db()),
            OrderError::Code(err) => {
                AppError::with_message(ErrorCode::OrderCodeInvalid, err.to_string())
            }
            OrderError::Otp(err) => err.into(),
            OrderError::Store(err) => err.into(),
        }
    }
}

impl From<EventStorageError> for AppError {
    fn from(e: EventStorageError) -> Self {
        tracing::error!(error = %e, "Event storage error");
        AppError::new(ErrorCode::DatabaseError)
    }
}

impl From<PartitionError> for AppError {
    fn from(e: PartitionError) -> Self {
        tracing::error!(error = %e, "Partition maintenance error");
        AppError::new(ErrorCode::DatabaseError)
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Otp(err) => err.into(),
            SessionError::Token(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::new(ErrorCode::TokenExpired)
                }
                _ => AppError::invalid_token(err.to_string()),
            },
        }
    }
}
