//! Orders
//!
//! - `code`: `<PREFIX>-<ULID>` order codes
//! - `store`: persistence boundary with Postgres and in-memory backends
//! - `partitions`: monthly partitions of the `orders` table
//! - `lifecycle`: the state machine driven by code verification

pub mod code;
pub mod error;
pub mod lifecycle;
mod memory;
pub mod partitions;
mod postgres;
pub mod store;

pub use code::{DEFAULT_PREFIX, OrderCode, OrderCodeError, OrderCodeGenerator};
pub use error::{OrderError, OrderResult};
pub use lifecycle::{CreatedOrder, NewOrderRequest, OrderLifecycle, REISSUE_ENDPOINT};
pub use memory::MemoryOrderStore;
pub use partitions::{MonthPartition, PartitionError, ensure_month_partition, ensure_partitions_ahead};
pub use postgres::PgOrderStore;
pub use store::{NewOrder, OrderStore, OrderStoreError, Transition};
