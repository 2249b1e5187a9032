use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::{Counter, TtlResult, TtlStore};

struct Entry {
    value: Option<Vec<u8>>,
    counter: u64,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process TTL store
///
/// Entry updates hold the DashMap shard lock, which makes `incr` and
/// `delete_if_eq` atomic. Uses tokio's clock so paused-time tests can expire
/// entries with `tokio::time::advance`.
#[derive(Default)]
pub struct MemoryTtlStore {
    entries: DashMap<String, Entry>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, live or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> TtlResult<()> {
        self.entries.insert(
            key.to_owned(),
            Entry {
                value: Some(value.to_vec()),
                counter: 0,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> TtlResult<Option<Vec<u8>>> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.value.clone()))
    }

    async fn delete(&self, key: &str) -> TtlResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, e)| e.is_live(now)))
    }

    async fn delete_if_eq(&self, key: &str, expected: &[u8]) -> TtlResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove_if(key, |_, e| {
                e.is_live(now) && e.value.as_deref() == Some(expected)
            })
            .is_some())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> TtlResult<Counter> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_owned()).or_insert_with(|| Entry {
            value: None,
            counter: 0,
            expires_at: now + ttl,
        });

        // Expired window: start over
        if !entry.is_live(now) {
            entry.counter = 0;
            entry.value = None;
            entry.expires_at = now + ttl;
        }

        entry.counter += 1;
        Ok(Counter {
            count: entry.counter,
            expires_in: entry.expires_at.saturating_duration_since(now),
        })
    }

    async fn purge_expired(&self) -> TtlResult<u64> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live(now));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_set_get_expires() {
        let store = MemoryTtlStore::new();
        store.set("otp:login:+911", b"hash", MINUTE).await.unwrap();
        assert_eq!(
            store.get("otp:login:+911").await.unwrap().as_deref(),
            Some(&b"hash"[..])
        );

        tokio::time::advance(MINUTE).await;
        assert_eq!(store.get("otp:login:+911").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_value_and_ttl() {
        let store = MemoryTtlStore::new();
        store.set("k", b"old", Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        store.set("k", b"new", Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(&b"new"[..]));
    }

    #[tokio::test]
    async fn test_delete_if_eq_only_matching() {
        let store = MemoryTtlStore::new();
        store.set("k", b"a", MINUTE).await.unwrap();
        assert!(!store.delete_if_eq("k", b"b").await.unwrap());
        assert!(store.delete_if_eq("k", b"a").await.unwrap());
        // Already consumed
        assert!(!store.delete_if_eq("k", b"a").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_incr_window_not_extended() {
        let store = MemoryTtlStore::new();
        let first = store.incr("rl", MINUTE).await.unwrap();
        assert_eq!(first.count, 1);
        assert_eq!(first.expires_in, MINUTE);

        tokio::time::advance(Duration::from_secs(40)).await;
        let second = store.incr("rl", MINUTE).await.unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(second.expires_in, Duration::from_secs(20));

        tokio::time::advance(Duration::from_secs(20)).await;
        let reset = store.incr("rl", MINUTE).await.unwrap();
        assert_eq!(reset.count, 1);
        assert_eq!(reset.expires_in, MINUTE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryTtlStore::new();
        store.set("short", b"x", Duration::from_secs(1)).await.unwrap();
        store.set("long", b"y", MINUTE).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_incr_is_atomic() {
        let store = std::sync::Arc::new(MemoryTtlStore::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.incr("rl", MINUTE).await.unwrap().count
            }));
        }
        let mut counts: Vec<u64> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        counts.sort_unstable();
        assert_eq!(counts, (1..=50).collect::<Vec<_>>());
    }
}
