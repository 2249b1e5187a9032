//! One-time code lifecycle: issue, verify, invalidate

use std::sync::Arc;
use std::time::Duration;

use shared::OtpPurpose;
use thiserror::Error;

use super::code::{self, OtpCode};
use super::hasher::OtpHasher;
use super::subject::SubjectKey;
use crate::rate_limit::{
    Decision, FailMode, RateLimit, RateLimiter, issue_bucket, verify_bucket,
};
use crate::ttl::{TtlStore, TtlStoreError};
use crate::util::{deadline, now_millis};

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Too many code requests, retry in {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("Too many verification attempts")]
    TooManyAttempts,
    #[error("Verification code expired or not found")]
    CodeExpiredOrNotFound,
    #[error("Invalid verification code")]
    InvalidCode,
    #[error(transparent)]
    Store(#[from] TtlStoreError),
}

/// Proof of a successful verification
///
/// Only [`OtpManager`] can construct one; the order store's confirm
/// transition takes it by value.
#[derive(Debug)]
#[must_use]
pub struct OtpReceipt {
    subject: SubjectKey,
    verified_at: i64,
}

impl OtpReceipt {
    pub fn subject(&self) -> &SubjectKey {
        &self.subject
    }

    /// Unix milliseconds
    pub fn verified_at(&self) -> i64 {
        self.verified_at
    }
}

/// TTLs and quotas for one-time codes
#[derive(Debug, Clone)]
pub struct OtpPolicy {
    pub register_ttl: Duration,
    pub login_ttl: Duration,
    pub order_ttl: Duration,
    /// Issuance quota per purpose, endpoint and identity
    pub issue_limit: RateLimit,
    /// Verification attempts allowed against one code
    pub verify_attempts: u64,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            register_ttl: Duration::from_secs(600),
            login_ttl: Duration::from_secs(300),
            order_ttl: Duration::from_secs(1800),
            issue_limit: RateLimit {
                quota: 5,
                window: Duration::from_secs(60),
                fail_mode: FailMode::Closed,
            },
            verify_attempts: 5,
        }
    }
}

impl OtpPolicy {
    pub fn ttl(&self, purpose: OtpPurpose) -> Duration {
        match purpose {
            OtpPurpose::Register => self.register_ttl,
            OtpPurpose::Login => self.login_ttl,
            OtpPurpose::OrderConfirm => self.order_ttl,
        }
    }

    /// Attempt budget spans the code lifetime
    fn verify_limit(&self, purpose: OtpPurpose) -> RateLimit {
        RateLimit {
            quota: self.verify_attempts,
            window: self.ttl(purpose),
            fail_mode: FailMode::Open,
        }
    }
}

/// OTP lifecycle manager
pub struct OtpManager {
    store: Arc<dyn TtlStore>,
    hasher: OtpHasher,
    limiter: RateLimiter,
    policy: OtpPolicy,
    timeout: Duration,
}

impl OtpManager {
    pub fn new(
        store: Arc<dyn TtlStore>,
        hasher: OtpHasher,
        policy: OtpPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            limiter: RateLimiter::new(store.clone(), timeout),
            store,
            hasher,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    /// Issue a fresh code for `subject`, replacing any live one
    ///
    /// Also clears the subject's verification-attempt counter.
    pub async fn issue(&self, subject: &SubjectKey, ttl: Duration) -> Result<OtpCode, OtpError> {
        let code = OtpCode::generate();
        let hash = self.hasher.digest(code.as_str());
        deadline(self.timeout, self.store.set(subject.as_str(), &hash, ttl)).await?;

        if let Err(e) = self.limiter.reset(&verify_bucket(subject.as_str())).await {
            tracing::warn!(subject = %subject, error = %e, "Failed to reset verification attempts");
        }

        tracing::debug!(subject = %subject, ttl_secs = ttl.as_secs(), "One-time code issued");
        Ok(code)
    }

    /// Check `candidate` against the live code and consume it on a match
    ///
    /// A mismatch keeps the code. Of two concurrent correct submissions only
    /// one gets a receipt; the other sees `CodeExpiredOrNotFound`.
    pub async fn verify(
        &self,
        subject: &SubjectKey,
        candidate: &str,
    ) -> Result<OtpReceipt, OtpError> {
        let Some(stored) = deadline(self.timeout, self.store.get(subject.as_str())).await? else {
            return Err(OtpError::CodeExpiredOrNotFound);
        };

        if !code::is_well_formed(candidate) || !self.hasher.matches(candidate, &stored) {
            tracing::debug!(subject = %subject, "One-time code mismatch");
            return Err(OtpError::InvalidCode);
        }

        let consumed =
            deadline(self.timeout, self.store.delete_if_eq(subject.as_str(), &stored)).await?;
        if !consumed {
            return Err(OtpError::CodeExpiredOrNotFound);
        }

        Ok(OtpReceipt {
            subject: subject.clone(),
            verified_at: now_millis(),
        })
    }

    /// Delete the live code for `subject`, if any
    pub async fn invalidate(&self, subject: &SubjectKey) -> Result<bool, OtpError> {
        Ok(deadline(self.timeout, self.store.delete(subject.as_str())).await?)
    }

    /// Rate-limited issue for an identity-scoped code
    pub async fn issue_code(
        &self,
        identity: &str,
        purpose: OtpPurpose,
        endpoint: &str,
    ) -> Result<OtpCode, OtpError> {
        let subject = SubjectKey::for_identity(purpose, identity);
        self.issue_gated(&subject, endpoint, identity).await
    }

    /// Rate-limited issue for any subject, counted against `identity` at `endpoint`
    pub async fn issue_gated(
        &self,
        subject: &SubjectKey,
        endpoint: &str,
        identity: &str,
    ) -> Result<OtpCode, OtpError> {
        let purpose = subject.purpose();
        let bucket = issue_bucket(purpose, endpoint, identity);

        if let Decision::Denied { retry_after } =
            self.limiter.check(&bucket, &self.policy.issue_limit).await?
        {
            return Err(OtpError::RateLimited { retry_after });
        }

        self.issue(subject, self.policy.ttl(purpose)).await
    }

    /// Attempt-limited verify
    ///
    /// Once the attempt budget is spent the live code is invalidated, so
    /// the caller must request a new one. With no live code left to spend
    /// the attempt on, the result is `CodeExpiredOrNotFound`.
    pub async fn verify_code(
        &self,
        subject: &SubjectKey,
        candidate: &str,
    ) -> Result<OtpReceipt, OtpError> {
        let limit = self.policy.verify_limit(subject.purpose());
        let bucket = verify_bucket(subject.as_str());

        if !self.limiter.check(&bucket, &limit).await?.is_allowed() {
            match self.invalidate(subject).await {
                Ok(false) => return Err(OtpError::CodeExpiredOrNotFound),
                Ok(true) => {
                    tracing::warn!(subject = %subject, "Verification attempts exhausted, code invalidated");
                }
                Err(e) => {
                    tracing::warn!(subject = %subject, error = %e, "Failed to invalidate exhausted code");
                }
            }
            return Err(OtpError::TooManyAttempts);
        }

        self.verify(subject, candidate).await
    }
}
