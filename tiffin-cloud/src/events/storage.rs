//! Lifecycle event storage
//!
//! Append-only: no update or delete interface. The Postgres table also
//! rejects UPDATE/DELETE with a trigger.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::order::{LifecycleEvent, LifecycleEventType};
use sqlx::PgPool;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum EventStorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Unknown event type in storage: {0}")]
    UnknownEventType(String),
}

pub type EventStorageResult<T> = Result<T, EventStorageError>;

#[async_trait]
pub trait EventStorage: Send + Sync {
    /// Append one event; returns its sequence number
    async fn append(&self, event: &LifecycleEvent) -> EventStorageResult<i64>;

    /// Events for one entity in `occurred_at` order
    async fn history(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> EventStorageResult<Vec<LifecycleEvent>>;
}

#[derive(sqlx::FromRow)]
struct EventRow {
    entity_type: String,
    entity_id: String,
    event_type: String,
    payload: serde_json::Value,
    occurred_at: i64,
}

impl TryFrom<EventRow> for LifecycleEvent {
    type Error = EventStorageError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let event_type = LifecycleEventType::from_db(&row.event_type)
            .ok_or(EventStorageError::UnknownEventType(row.event_type))?;
        Ok(LifecycleEvent {
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            event_type,
            payload: row.payload,
            occurred_at: row.occurred_at,
        })
    }
}

/// `lifecycle_events` table
#[derive(Clone)]
pub struct PgEventStorage {
    pool: PgPool,
}

impl PgEventStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStorage for PgEventStorage {
    async fn append(&self, event: &LifecycleEvent) -> EventStorageResult<i64> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO lifecycle_events (entity_type, entity_id, event_type, payload, occurred_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(&event.entity_type)
        .bind(&event.entity_id)
        .bind(event.event_type.as_str())
        .bind(&event.payload)
        .bind(event.occurred_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn history(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> EventStorageResult<Vec<LifecycleEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT entity_type, entity_id, event_type, payload, occurred_at
             FROM lifecycle_events
             WHERE entity_type = $1 AND entity_id = $2
             ORDER BY occurred_at, id",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LifecycleEvent::try_from).collect()
    }
}

/// In-process event storage
#[derive(Default)]
pub struct MemoryEventStorage {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl MemoryEventStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended so far, in append order
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventStorage for MemoryEventStorage {
    async fn append(&self, event: &LifecycleEvent) -> EventStorageResult<i64> {
        let mut events = self.events.lock();
        events.push(event.clone());
        Ok(events.len() as i64)
    }

    async fn history(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> EventStorageResult<Vec<LifecycleEvent>> {
        let mut matching: Vec<LifecycleEvent> = self
            .events
            .lock()
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect();
        // Stable: same-millisecond events keep append order
        matching.sort_by_key(|e| e.occurred_at);
        Ok(matching)
    }
}
