//! Lifecycle event log
//!
//! `record` hands the event to a bounded mpsc channel without waiting; the
//! [`EventWorker`](super::EventWorker) drains it into storage. A full or
//! closed channel drops the event with an error log; the caller's operation
//! has already committed and is never failed by the audit trail.

use std::sync::Arc;

use shared::order::LifecycleEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::storage::{EventStorage, EventStorageResult};

#[derive(Clone)]
pub struct EventLog {
    tx: mpsc::Sender<LifecycleEvent>,
    storage: Arc<dyn EventStorage>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("capacity", &self.tx.capacity())
            .finish_non_exhaustive()
    }
}

impl EventLog {
    pub fn new(
        storage: Arc<dyn EventStorage>,
        buffer_size: usize,
    ) -> (Self, mpsc::Receiver<LifecycleEvent>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        (Self { tx, storage }, rx)
    }

    /// Queue an event for persistence (never blocks)
    pub fn record(&self, event: LifecycleEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::error!(
                    entity_id = %event.entity_id,
                    event_type = %event.event_type,
                    "Event buffer full, dropping lifecycle event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                tracing::error!(
                    entity_id = %event.entity_id,
                    event_type = %event.event_type,
                    "Event worker stopped, dropping lifecycle event"
                );
            }
        }
    }

    /// Persisted events for one entity
    pub async fn history(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> EventStorageResult<Vec<LifecycleEvent>> {
        self.storage.history(entity_type, entity_id).await
    }
}
