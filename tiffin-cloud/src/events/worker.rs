//! Event log background worker
//!
//! Consumes lifecycle events from the mpsc channel and appends them to
//! storage. Exits when every [`EventLog`](super::EventLog) handle is dropped.

use std::sync::Arc;

use shared::order::LifecycleEvent;
use tokio::sync::mpsc;

use super::storage::EventStorage;

pub struct EventWorker {
    storage: Arc<dyn EventStorage>,
}

impl EventWorker {
    pub fn new(storage: Arc<dyn EventStorage>) -> Self {
        Self { storage }
    }

    /// Run until the channel closes
    pub async fn run(self, mut rx: mpsc::Receiver<LifecycleEvent>) {
        tracing::info!("Lifecycle event worker started");

        while let Some(event) = rx.recv().await {
            match self.storage.append(&event).await {
                Ok(seq) => {
                    tracing::debug!(
                        seq,
                        entity_id = %event.entity_id,
                        event_type = %event.event_type,
                        "Lifecycle event recorded"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        entity_id = %event.entity_id,
                        event_type = %event.event_type,
                        error = %e,
                        "Failed to write lifecycle event"
                    );
                }
            }
        }

        tracing::info!("Lifecycle event channel closed, worker stopping");
    }
}
