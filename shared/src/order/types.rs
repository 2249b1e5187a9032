//! Order line items

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of an order
///
/// Opaque to the confirmation core apart from validation; the catalog owns
/// names and prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// `unit_price * quantity`
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of all line totals
pub fn items_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}
