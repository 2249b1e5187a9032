//! Order record and status

use super::types::LineItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
///
/// ```text
/// CREATED ──► (PENDING_PROVIDER_ACK) ──► CONFIRMED ──► COMPLETED
///    │                 │                     │
///    └─────────────────┴─────────────────────┴──► CANCELLED
/// ```
///
/// `PendingProviderAck` is reserved: no operation enters it yet, but every
/// transition that accepts `Created` accepts it too.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
    PendingProviderAck,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "PENDING_PROVIDER_ACK" => Some(Self::PendingProviderAck),
            "CONFIRMED" => Some(Self::Confirmed),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::PendingProviderAck => "PENDING_PROVIDER_ACK",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states are retained for audit and never left
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the buyer's one-time code can still confirm the order
    pub fn awaits_confirmation(&self) -> bool {
        matches!(self, Self::Created | Self::PendingProviderAck)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Persisted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Internal primary key, never shown to users
    pub id: i64,
    /// External identifier (`<PREFIX>-<ULID>`)
    pub order_code: String,
    pub buyer_id: i64,
    pub provider_id: i64,
    pub items: Vec<LineItem>,
    pub total_estimate: Decimal,
    pub status: OrderStatus,
    /// Unix milliseconds; also the partition key
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for status in [
            OrderStatus::Created,
            OrderStatus::PendingProviderAck,
            OrderStatus::Confirmed,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(OrderStatus::from_db("VOID"), None);
    }

    #[test]
    fn test_status_serde_matches_db() {
        let json = serde_json::to_string(&OrderStatus::PendingProviderAck).unwrap();
        assert_eq!(json, "\"PENDING_PROVIDER_ACK\"");
    }

    #[test]
    fn test_terminal_and_awaiting() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());

        assert!(OrderStatus::Created.awaits_confirmation());
        assert!(OrderStatus::PendingProviderAck.awaits_confirmation());
        assert!(!OrderStatus::Confirmed.awaits_confirmation());
    }
}
