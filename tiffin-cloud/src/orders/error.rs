use shared::order::OrderStatus;
use thiserror::Error;

use super::code::OrderCodeError;
use super::store::OrderStoreError;
use crate::otp::OtpError;

/// Order lifecycle errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid order: {0}")]
    Validation(String),

    #[error("Order has no items")]
    Empty,

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order {order_id} cannot move from {current} to {target}")]
    InvalidStateTransition {
        order_id: i64,
        current: OrderStatus,
        target: OrderStatus,
    },

    #[error(transparent)]
    Code(#[from] OrderCodeError),

    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error("Storage error: {0}")]
    Store(#[from] OrderStoreError),
}

pub type OrderResult<T> = Result<T, OrderError>;
