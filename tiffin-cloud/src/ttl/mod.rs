//! Key/value store with per-key expiry
//!
//! Holds one-time code hashes and rate-limit counters. Every operation is a
//! single atomic store operation; callers never take in-process locks around
//! a read-modify-write.
//!
//! | Backend          | Storage                          |
//! |------------------|----------------------------------|
//! | `MemoryTtlStore` | DashMap, single process only     |
//! | `PgTtlStore`     | UNLOGGED `ttl_entries` table     |

mod memory;
mod postgres;

pub use memory::MemoryTtlStore;
pub use postgres::PgTtlStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::util::StoreTimeout;

/// TTL store errors
#[derive(Debug, Error)]
pub enum TtlStoreError {
    #[error(transparent)]
    Timeout(#[from] StoreTimeout),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("TTL store unavailable: {0}")]
    Unavailable(String),
}

pub type TtlResult<T> = Result<T, TtlStoreError>;

/// Counter state after an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    /// Post-increment value
    pub count: u64,
    /// Time left before the counter resets
    pub expires_in: Duration,
}

#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry and its TTL
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> TtlResult<()>;

    /// Live value for `key`
    async fn get(&self, key: &str) -> TtlResult<Option<Vec<u8>>>;

    /// Remove `key`; returns whether a live entry was removed
    async fn delete(&self, key: &str) -> TtlResult<bool>;

    /// Remove `key` only if it still holds `expected`
    async fn delete_if_eq(&self, key: &str, expected: &[u8]) -> TtlResult<bool>;

    /// Increment the counter at `key`
    ///
    /// A missing or expired counter starts at 1 with expiry `ttl`; later
    /// increments never extend it.
    async fn incr(&self, key: &str, ttl: Duration) -> TtlResult<Counter>;

    /// Drop expired entries; returns how many were removed
    async fn purge_expired(&self) -> TtlResult<u64>;
}
