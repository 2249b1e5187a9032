use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::order::{LineItem, Order, OrderStatus};
use sqlx::PgPool;
use sqlx::types::Json;

use super::code::OrderCode;
use super::store::{NewOrder, OrderStore, OrderStoreError, OrderStoreResult, Transition};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_code: String,
    buyer_id: i64,
    provider_id: i64,
    items: Json<Vec<LineItem>>,
    total_estimate: Decimal,
    status: String,
    created_at: i64,
    confirmed_at: Option<i64>,
    completed_at: Option<i64>,
    cancelled_at: Option<i64>,
}

impl TryFrom<OrderRow> for Order {
    type Error = OrderStoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status =
            OrderStatus::from_db(&row.status).ok_or_else(|| OrderStoreError::CorruptRow {
                order_id: row.id,
                reason: format!("unknown status {:?}", row.status),
            })?;
        Ok(Order {
            id: row.id,
            order_code: row.order_code,
            buyer_id: row.buyer_id,
            provider_id: row.provider_id,
            items: row.items.0,
            total_estimate: row.total_estimate,
            status,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

/// Orders in the month-partitioned `orders` table
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> OrderStoreResult<Order> {
        let created_at = order.created_at();
        let row: OrderRow = sqlx::query_as(
            "INSERT INTO orders
                (order_code, buyer_id, provider_id, items, total_estimate, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(order.order_code.as_str())
        .bind(order.buyer_id)
        .bind(order.provider_id)
        .bind(Json(&order.items))
        .bind(order.total_estimate)
        .bind(OrderStatus::Created.as_db())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                OrderStoreError::CodeConflict(order.order_code.to_string())
            }
            other => OrderStoreError::Database(other),
        })?;
        row.try_into()
    }

    async fn get(&self, id: i64) -> OrderStoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn find_by_code(&self, code: &OrderCode) -> OrderStoreResult<Option<Order>> {
        // created_at equality lets the planner prune to one partition
        let row: Option<OrderRow> =
            sqlx::query_as("SELECT * FROM orders WHERE order_code = $1 AND created_at = $2")
                .bind(code.as_str())
                .bind(code.timestamp_ms())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Order::try_from).transpose()
    }

    async fn transition(
        &self,
        id: i64,
        transition: &Transition,
        at: i64,
    ) -> OrderStoreResult<Option<Order>> {
        transition.check_receipt(id)?;

        let sources: Vec<String> = transition
            .sources()
            .iter()
            .map(|s| s.as_db().to_string())
            .collect();
        let sql = format!(
            "UPDATE orders SET status = $2, {} = $3
             WHERE id = $1 AND status = ANY($4)
             RETURNING *",
            transition.stamp_column()
        );

        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(transition.target().as_db())
            .bind(at)
            .bind(sources)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }
}
