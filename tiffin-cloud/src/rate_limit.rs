//! Fixed-window rate limiting on top of the TTL store
//!
//! Counters live in the TTL store under bucket keys:
//! - `rl:issue:<purpose>:<endpoint>:<identity>`: code issuance
//! - `rl:verify:<subject key>`: verification attempts against one code

use std::sync::Arc;
use std::time::Duration;

use shared::OtpPurpose;

use crate::ttl::{TtlStore, TtlStoreError};
use crate::util::deadline;

/// What to do when the counter store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// Reject the request
    Closed,
    /// Admit the request and log a warning
    Open,
}

/// Quota per window for one class of bucket
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub quota: u64,
    pub window: Duration,
    pub fail_mode: FailMode,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

pub fn issue_bucket(purpose: OtpPurpose, endpoint: &str, identity: &str) -> String {
    format!("rl:issue:{purpose}:{endpoint}:{identity}")
}

pub fn verify_bucket(subject: &str) -> String {
    format!("rl:verify:{subject}")
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn TtlStore>,
    timeout: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn TtlStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Count one request against `bucket`
    ///
    /// The increment stands even when the request is denied. A store failure
    /// is an error under `FailMode::Closed` and an admission under `FailMode::Open`.
    pub async fn check(&self, bucket: &str, limit: &RateLimit) -> Result<Decision, TtlStoreError> {
        match deadline(self.timeout, self.store.incr(bucket, limit.window)).await {
            Ok(counter) if counter.count <= limit.quota => Ok(Decision::Allowed),
            Ok(counter) => {
                tracing::warn!(
                    bucket = %bucket,
                    count = counter.count,
                    quota = limit.quota,
                    "Rate limit exceeded"
                );
                Ok(Decision::Denied {
                    retry_after: counter.expires_in,
                })
            }
            Err(e) => match limit.fail_mode {
                FailMode::Closed => {
                    tracing::error!(bucket = %bucket, error = %e, "Rate limit store failure, rejecting");
                    Err(e)
                }
                FailMode::Open => {
                    tracing::warn!(bucket = %bucket, error = %e, "Rate limit store failure, admitting");
                    Ok(Decision::Allowed)
                }
            },
        }
    }

    /// Drop the counter for `bucket`, starting a fresh window on the next check
    pub async fn reset(&self, bucket: &str) -> Result<(), TtlStoreError> {
        deadline(self.timeout, self.store.delete(bucket)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ttl::MemoryTtlStore;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryTtlStore::new()), Duration::from_millis(300))
    }

    const LIMIT: RateLimit = RateLimit {
        quota: 3,
        window: Duration::from_secs(60),
        fail_mode: FailMode::Closed,
    };

    #[test]
    fn test_bucket_keys() {
        assert_eq!(
            issue_bucket(OtpPurpose::Login, "login", "+919800000000"),
            "rl:issue:login:login:+919800000000"
        );
        assert_eq!(verify_bucket("order-otp:17"), "rl:verify:order-otp:17");
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_then_deny_then_new_window() {
        let rl = limiter();
        for _ in 0..3 {
            assert!(rl.check("b", &LIMIT).await.unwrap().is_allowed());
        }

        tokio::time::advance(Duration::from_secs(15)).await;
        let denied = rl.check("b", &LIMIT).await.unwrap();
        assert_eq!(
            denied,
            Decision::Denied {
                retry_after: Duration::from_secs(45)
            }
        );

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(rl.check("b", &LIMIT).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_buckets_are_independent() {
        let rl = limiter();
        for _ in 0..3 {
            rl.check("a", &LIMIT).await.unwrap();
        }
        assert!(!rl.check("a", &LIMIT).await.unwrap().is_allowed());
        assert!(rl.check("b", &LIMIT).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_reset_restores_budget() {
        let rl = limiter();
        for _ in 0..4 {
            rl.check("a", &LIMIT).await.unwrap();
        }
        rl.reset("a").await.unwrap();
        assert!(rl.check("a", &LIMIT).await.unwrap().is_allowed());
    }
}
