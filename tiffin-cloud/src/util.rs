//! Shared utility functions for tiffin-cloud

use std::future::Future;
use std::time::Duration;

pub use shared::util::now_millis;

/// An external store call ran past its deadline
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("store call exceeded {0:?}")]
pub struct StoreTimeout(pub Duration);

/// Run a store call under `tokio::time::timeout`, mapping expiry into the caller's error type
pub async fn deadline<F, T, E>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<StoreTimeout>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(StoreTimeout(limit).into()),
    }
}

/// Whole seconds, rounded up so a retry hint never undershoots
pub fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 { secs + 1 } else { secs }
}
