//! Order persistence boundary

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::order::{LineItem, Order, OrderStatus};
use thiserror::Error;

use super::code::OrderCode;
use crate::otp::{OtpReceipt, SubjectKey};
use crate::util::StoreTimeout;

/// Storage errors
#[derive(Debug, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Timeout(#[from] StoreTimeout),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Order code already exists: {0}")]
    CodeConflict(String),
    #[error("Receipt for {receipt} cannot confirm order {order_id}")]
    ReceiptMismatch { order_id: i64, receipt: String },
    #[error("Corrupt order row {order_id}: {reason}")]
    CorruptRow { order_id: i64, reason: String },
}

pub type OrderStoreResult<T> = Result<T, OrderStoreError>;

/// Row to insert; `created_at` is the code's embedded timestamp
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_code: OrderCode,
    pub buyer_id: i64,
    pub provider_id: i64,
    pub items: Vec<LineItem>,
    pub total_estimate: Decimal,
}

impl NewOrder {
    pub fn created_at(&self) -> i64 {
        self.order_code.timestamp_ms()
    }
}

/// Status change applied with a compare-and-set on the current status
#[derive(Debug)]
pub enum Transition {
    /// Only reachable through a successful code verification
    Confirm(OtpReceipt),
    Complete,
    Cancel,
}

impl Transition {
    /// Statuses the transition may start from
    pub fn sources(&self) -> &'static [OrderStatus] {
        match self {
            Transition::Confirm(_) => &[OrderStatus::Created, OrderStatus::PendingProviderAck],
            Transition::Complete => &[OrderStatus::Confirmed],
            Transition::Cancel => &[
                OrderStatus::Created,
                OrderStatus::PendingProviderAck,
                OrderStatus::Confirmed,
            ],
        }
    }

    pub fn target(&self) -> OrderStatus {
        match self {
            Transition::Confirm(_) => OrderStatus::Confirmed,
            Transition::Complete => OrderStatus::Completed,
            Transition::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Timestamp column stamped by the transition
    pub fn stamp_column(&self) -> &'static str {
        match self {
            Transition::Confirm(_) => "confirmed_at",
            Transition::Complete => "completed_at",
            Transition::Cancel => "cancelled_at",
        }
    }

    /// A confirm receipt must have been issued for this very order
    pub fn check_receipt(&self, order_id: i64) -> OrderStoreResult<()> {
        if let Transition::Confirm(receipt) = self
            && receipt.subject() != &SubjectKey::for_order(order_id)
        {
            return Err(OrderStoreError::ReceiptMismatch {
                order_id,
                receipt: receipt.subject().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order in status `CREATED`
    async fn insert(&self, order: NewOrder) -> OrderStoreResult<Order>;

    async fn get(&self, id: i64) -> OrderStoreResult<Option<Order>>;

    /// Lookup confined to the partition implied by the code's timestamp
    async fn find_by_code(&self, code: &OrderCode) -> OrderStoreResult<Option<Order>>;

    /// Apply `transition` if the order is currently in one of its sources
    ///
    /// Returns the updated order, or `None` when no row matched (unknown id
    /// or a status outside the sources).
    async fn transition(
        &self,
        id: i64,
        transition: &Transition,
        at: i64,
    ) -> OrderStoreResult<Option<Order>>;
}
