//! Order lifecycle controller
//!
//! ```text
//! CREATED ──confirm_with_otp──▶ CONFIRMED ──complete──▶ COMPLETED
//!    │  (PENDING_PROVIDER_ACK reserved)  │
//!    └────────────cancel─────────────────┴──▶ CANCELLED
//! ```
//!
//! Every transition is a compare-and-set on the stored status, and every
//! transition records one lifecycle event. `CONFIRMED` is only reachable
//! with an [`OtpReceipt`](crate::otp::OtpReceipt) from a successful verify.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use shared::OtpPurpose;
use shared::order::{LifecycleEvent, LifecycleEventType, LineItem, Order, OrderStatus, items_total};

use super::code::{OrderCode, OrderCodeGenerator};
use super::error::{OrderError, OrderResult};
use super::store::{NewOrder, OrderStore, Transition};
use crate::events::EventLog;
use crate::otp::{OtpCode, OtpError, OtpManager, SubjectKey};
use crate::util::{deadline, now_millis};

/// Rate-limit endpoint for order code reissues
pub const REISSUE_ENDPOINT: &str = "order-reissue";

/// Input for [`OrderLifecycle::create`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderRequest {
    pub buyer_id: i64,
    pub provider_id: i64,
    pub items: Vec<LineItem>,
    pub total_estimate: Decimal,
}

impl NewOrderRequest {
    fn validate(&self) -> OrderResult<()> {
        if self.items.is_empty() {
            return Err(OrderError::Empty);
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(OrderError::Validation("item name is empty".into()));
            }
            if item.quantity == 0 {
                return Err(OrderError::Validation(format!(
                    "item {:?} has zero quantity",
                    item.name
                )));
            }
            if item.unit_price.is_sign_negative() {
                return Err(OrderError::Validation(format!(
                    "item {:?} has a negative price",
                    item.name
                )));
            }
        }
        if self.total_estimate.is_sign_negative() {
            return Err(OrderError::Validation("total estimate is negative".into()));
        }
        if self.buyer_id == self.provider_id {
            return Err(OrderError::Validation(
                "buyer and provider must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Result of [`OrderLifecycle::create`]
///
/// `otp` is `None` when the order committed but its code could not be
/// issued; [`OrderLifecycle::reissue_otp`] recovers.
#[derive(Debug)]
pub struct CreatedOrder {
    pub order_id: i64,
    pub order_code: String,
    pub otp: Option<OtpCode>,
}

pub struct OrderLifecycle {
    store: Arc<dyn OrderStore>,
    otp: Arc<OtpManager>,
    codes: OrderCodeGenerator,
    events: EventLog,
    timeout: Duration,
}

impl OrderLifecycle {
    pub fn new(
        store: Arc<dyn OrderStore>,
        otp: Arc<OtpManager>,
        codes: OrderCodeGenerator,
        events: EventLog,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            otp,
            codes,
            events,
            timeout,
        }
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Persist a new order and issue its confirmation code
    pub async fn create(&self, req: NewOrderRequest) -> OrderResult<CreatedOrder> {
        req.validate()?;

        // One clock reading: the code's timestamp is the order's created_at
        let order_code = self.codes.generate_at(now_millis())?;
        let line_total = items_total(&req.items);
        let new = NewOrder {
            order_code,
            buyer_id: req.buyer_id,
            provider_id: req.provider_id,
            items: req.items,
            total_estimate: req.total_estimate,
        };
        let order = deadline(self.timeout, self.store.insert(new)).await?;

        self.events.record(LifecycleEvent::order(
            order.id,
            LifecycleEventType::OrderCreated,
            json!({
                "order_code": order.order_code,
                "buyer_id": order.buyer_id,
                "provider_id": order.provider_id,
                "item_count": order.items.len(),
                "total_estimate": order.total_estimate.to_string(),
                "items_total": line_total.to_string(),
            }),
        ));
        tracing::info!(order_id = order.id, order_code = %order.order_code, "Order created");

        let subject = SubjectKey::for_order(order.id);
        let ttl = self.otp.policy().ttl(OtpPurpose::OrderConfirm);
        let otp = match self.otp.issue(&subject, ttl).await {
            Ok(code) => Some(code),
            Err(e) => {
                tracing::error!(
                    order_id = order.id,
                    error = %e,
                    "Order committed but confirmation code issue failed, reissue required"
                );
                None
            }
        };

        Ok(CreatedOrder {
            order_id: order.id,
            order_code: order.order_code,
            otp,
        })
    }

    /// Confirm an order with the code the buyer received
    ///
    /// The status is checked before the code is touched, so a confirm
    /// against a finished order spends neither the code nor an attempt.
    pub async fn confirm_with_otp(&self, order_id: i64, code: &str) -> OrderResult<Order> {
        let order = self.get(order_id).await?;
        if !order.status.awaits_confirmation() {
            return Err(OrderError::InvalidStateTransition {
                order_id,
                current: order.status,
                target: OrderStatus::Confirmed,
            });
        }

        let subject = SubjectKey::for_order(order_id);
        let receipt = match self.otp.verify_code(&subject, code).await {
            Ok(receipt) => receipt,
            Err(OtpError::InvalidCode) => {
                self.events.record(LifecycleEvent::order(
                    order_id,
                    LifecycleEventType::OrderConfirmRejected,
                    json!({ "reason": "invalid_code" }),
                ));
                tracing::warn!(order_id, "Order confirmation rejected: invalid code");
                return Err(OtpError::InvalidCode.into());
            }
            Err(e) => return Err(e.into()),
        };

        let confirmed = self.apply(order_id, Transition::Confirm(receipt)).await?;
        self.events.record(LifecycleEvent::order(
            order_id,
            LifecycleEventType::OrderConfirmed,
            json!({ "from": order.status.as_db() }),
        ));
        tracing::info!(order_id, "Order confirmed");
        Ok(confirmed)
    }

    /// Cancel from any non-terminal status
    pub async fn cancel(&self, order_id: i64) -> OrderResult<Order> {
        let order = self.get(order_id).await?;
        if order.status.is_terminal() {
            return Err(OrderError::InvalidStateTransition {
                order_id,
                current: order.status,
                target: OrderStatus::Cancelled,
            });
        }

        let cancelled = self.apply(order_id, Transition::Cancel).await?;

        if let Err(e) = self.otp.invalidate(&SubjectKey::for_order(order_id)).await {
            tracing::warn!(order_id, error = %e, "Failed to invalidate code of cancelled order");
        }

        self.events.record(LifecycleEvent::order(
            order_id,
            LifecycleEventType::OrderCancelled,
            json!({ "from": order.status.as_db() }),
        ));
        tracing::info!(order_id, "Order cancelled");
        Ok(cancelled)
    }

    /// Complete a confirmed order
    pub async fn complete(&self, order_id: i64) -> OrderResult<Order> {
        let completed = self.apply(order_id, Transition::Complete).await?;
        self.events.record(LifecycleEvent::order(
            order_id,
            LifecycleEventType::OrderCompleted,
            json!({}),
        ));
        tracing::info!(order_id, "Order completed");
        Ok(completed)
    }

    /// Issue a replacement confirmation code
    ///
    /// Counts against the issuance quota keyed by the order id.
    pub async fn reissue_otp(&self, order_id: i64) -> OrderResult<OtpCode> {
        let order = self.get(order_id).await?;
        if !order.status.awaits_confirmation() {
            return Err(OrderError::InvalidStateTransition {
                order_id,
                current: order.status,
                target: OrderStatus::Confirmed,
            });
        }

        let subject = SubjectKey::for_order(order_id);
        let code = self
            .otp
            .issue_gated(&subject, REISSUE_ENDPOINT, &order_id.to_string())
            .await?;

        self.events.record(LifecycleEvent::order(
            order_id,
            LifecycleEventType::OrderOtpReissued,
            json!({}),
        ));
        tracing::info!(order_id, "Order confirmation code reissued");
        Ok(code)
    }

    pub async fn get(&self, order_id: i64) -> OrderResult<Order> {
        deadline(self.timeout, self.store.get(order_id))
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    /// Lookup by the external order code
    pub async fn find_by_code(&self, order_code: &str) -> OrderResult<Order> {
        let code = OrderCode::parse(order_code)?;
        deadline(self.timeout, self.store.find_by_code(&code))
            .await?
            .ok_or_else(|| OrderError::NotFound(order_code.to_string()))
    }

    async fn apply(&self, order_id: i64, transition: Transition) -> OrderResult<Order> {
        let at = now_millis();
        let updated = deadline(self.timeout, self.store.transition(order_id, &transition, at))
            .await?;
        match updated {
            Some(order) => Ok(order),
            None => {
                let current = self.get(order_id).await?.status;
                Err(OrderError::InvalidStateTransition {
                    order_id,
                    current,
                    target: transition.target(),
                })
            }
        }
    }
}
