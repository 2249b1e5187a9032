//! Lifecycle event log
//!
//! ```text
//! OrderLifecycle ──record()──▶ mpsc ──▶ EventWorker ──▶ EventStorage (lifecycle_events)
//! ```

pub mod service;
pub mod storage;
pub mod worker;

pub use service::EventLog;
pub use storage::{
    EventStorage, EventStorageError, EventStorageResult, MemoryEventStorage, PgEventStorage,
};
pub use worker::EventWorker;
