use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::order::{Order, OrderStatus};

use super::code::OrderCode;
use super::store::{NewOrder, OrderStore, OrderStoreError, OrderStoreResult, Transition};

/// In-process order store
///
/// Transitions run under the DashMap shard lock, giving the same
/// compare-and-set semantics as the conditional UPDATE in Postgres.
pub struct MemoryOrderStore {
    orders: DashMap<i64, Order>,
    /// order_code -> id
    codes: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self {
            orders: DashMap::new(),
            codes: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> OrderStoreResult<Order> {
        let created_at = order.created_at();
        let slot = match self.codes.entry(order.order_code.as_str().to_string()) {
            Entry::Occupied(_) => {
                return Err(OrderStoreError::CodeConflict(order.order_code.to_string()));
            }
            Entry::Vacant(slot) => slot,
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = Order {
            id,
            order_code: order.order_code.to_string(),
            buyer_id: order.buyer_id,
            provider_id: order.provider_id,
            items: order.items,
            total_estimate: order.total_estimate,
            status: OrderStatus::Created,
            created_at,
            confirmed_at: None,
            completed_at: None,
            cancelled_at: None,
        };
        self.orders.insert(id, record.clone());
        slot.insert(id);
        Ok(record)
    }

    async fn get(&self, id: i64) -> OrderStoreResult<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn find_by_code(&self, code: &OrderCode) -> OrderStoreResult<Option<Order>> {
        let Some(id) = self.codes.get(code.as_str()).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self
            .orders
            .get(&id)
            .filter(|o| o.created_at == code.timestamp_ms())
            .map(|o| o.clone()))
    }

    async fn transition(
        &self,
        id: i64,
        transition: &Transition,
        at: i64,
    ) -> OrderStoreResult<Option<Order>> {
        transition.check_receipt(id)?;

        let Some(mut order) = self.orders.get_mut(&id) else {
            return Ok(None);
        };
        if !transition.sources().contains(&order.status) {
            return Ok(None);
        }

        order.status = transition.target();
        match transition {
            Transition::Confirm(_) => order.confirmed_at = Some(at),
            Transition::Complete => order.completed_at = Some(at),
            Transition::Cancel => order.cancelled_at = Some(at),
        }
        Ok(Some(order.clone()))
    }
}
