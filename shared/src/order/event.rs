//! Lifecycle events - immutable facts recorded after every order transition

use serde::{Deserialize, Serialize};

/// Entity type recorded for order lifecycle events
pub const ORDER_ENTITY: &str = "order";

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleEventType {
    OrderCreated,
    OrderConfirmed,
    /// Wrong code submitted; state unchanged
    OrderConfirmRejected,
    OrderCancelled,
    OrderCompleted,
    OrderOtpReissued,
}

impl LifecycleEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated => "ORDER_CREATED",
            Self::OrderConfirmed => "ORDER_CONFIRMED",
            Self::OrderConfirmRejected => "ORDER_CONFIRM_REJECTED",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::OrderCompleted => "ORDER_COMPLETED",
            Self::OrderOtpReissued => "ORDER_OTP_REISSUED",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "ORDER_CREATED" => Some(Self::OrderCreated),
            "ORDER_CONFIRMED" => Some(Self::OrderConfirmed),
            "ORDER_CONFIRM_REJECTED" => Some(Self::OrderConfirmRejected),
            "ORDER_CANCELLED" => Some(Self::OrderCancelled),
            "ORDER_COMPLETED" => Some(Self::OrderCompleted),
            "ORDER_OTP_REISSUED" => Some(Self::OrderOtpReissued),
            _ => None,
        }
    }
}

impl std::fmt::Display for LifecycleEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecycleEvent {
    /// Resource type (e.g. "order")
    pub entity_type: String,
    /// Resource ID
    pub entity_id: String,
    pub event_type: LifecycleEventType,
    /// Structured details (JSON object)
    pub payload: serde_json::Value,
    /// Unix milliseconds
    pub occurred_at: i64,
}

impl LifecycleEvent {
    /// Build an order event stamped with the current time
    pub fn order(order_id: i64, event_type: LifecycleEventType, payload: serde_json::Value) -> Self {
        Self {
            entity_type: ORDER_ENTITY.to_string(),
            entity_id: order_id.to_string(),
            event_type,
            payload,
            occurred_at: crate::util::now_millis(),
        }
    }
}
