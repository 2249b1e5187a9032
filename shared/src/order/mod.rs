//! Order domain types
//!
//! - Records: the persisted order and its status machine
//! - Items: opaque line items carried by an order
//! - Events: immutable lifecycle facts recorded after every transition

pub mod event;
pub mod snapshot;
pub mod types;

// Re-exports
pub use event::{LifecycleEvent, LifecycleEventType, ORDER_ENTITY};
pub use snapshot::{Order, OrderStatus};
pub use types::*;
