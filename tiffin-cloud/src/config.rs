//! Cloud service configuration

use std::time::Duration;

use crate::auth::DEFAULT_SESSION_TTL_HOURS;
use crate::orders::DEFAULT_PREFIX;
use crate::otp::OtpPolicy;
use crate::rate_limit::{FailMode, RateLimit};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Allowed lifetime range for any one-time code
const MIN_CODE_TTL_SECS: u64 = 5 * 60;
const MAX_CODE_TTL_SECS: u64 = 30 * 60;

/// Where short-lived entries (code hashes, rate-limit counters) live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlBackend {
    Postgres,
    /// Single process only; entries vanish on restart
    Memory,
}

/// Cloud service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Environment: development | staging | production
    pub environment: String,
    /// HMAC key for one-time code hashes
    pub otp_secret: String,
    /// JWT secret for session tokens
    pub jwt_secret: String,
    /// Order code prefix (1-8 uppercase letters)
    pub order_code_prefix: String,
    /// Deadline for every TTL store and order store call
    pub store_timeout: Duration,
    pub otp_ttl_register: Duration,
    pub otp_ttl_login: Duration,
    pub otp_ttl_order: Duration,
    /// Code requests per purpose, endpoint and identity per window
    pub otp_issue_quota: u64,
    pub otp_issue_window: Duration,
    /// Verification attempts per code
    pub otp_verify_attempts: u64,
    pub ttl_backend: TtlBackend,
    /// Lifecycle event channel capacity
    pub event_buffer_size: usize,
    /// Monthly order partitions kept ready beyond the current month
    pub partition_months_ahead: u32,
    pub session_ttl_hours: i64,
}

impl Config {
    /// Require a secret: must be set and non-empty in non-development environments.
    fn require_secret(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        environment: &str,
    ) -> Result<String, BoxError> {
        let val = match lookup(name) {
            Some(v) => v,
            None => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parsed<T: std::str::FromStr>(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        default: T,
    ) -> Result<T, BoxError> {
        match lookup(name).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("{name} has an invalid value: {raw:?}").into()),
            None => Ok(default),
        }
    }

    /// A count or duration that must be at least 1
    fn positive(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        default: u64,
    ) -> Result<u64, BoxError> {
        let value = Self::parsed(lookup, name, default)?;
        if value == 0 {
            return Err(format!("{name} must be greater than zero").into());
        }
        Ok(value)
    }

    fn code_ttl(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        default_secs: u64,
    ) -> Result<Duration, BoxError> {
        let secs = Self::parsed(lookup, name, default_secs)?;
        if !(MIN_CODE_TTL_SECS..=MAX_CODE_TTL_SECS).contains(&secs) {
            return Err(format!(
                "{name} must be between {MIN_CODE_TTL_SECS} and {MAX_CODE_TTL_SECS} seconds"
            )
            .into());
        }
        Ok(Duration::from_secs(secs))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let ttl_backend = match lookup("TTL_STORE_BACKEND").as_deref() {
            None | Some("") | Some("postgres") => TtlBackend::Postgres,
            Some("memory") => TtlBackend::Memory,
            Some(other) => return Err(format!("Unknown TTL_STORE_BACKEND: {other}").into()),
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            otp_secret: Self::require_secret(&lookup, "OTP_SECRET", &environment)?,
            jwt_secret: Self::require_secret(&lookup, "JWT_SECRET", &environment)?,
            order_code_prefix: lookup("ORDER_CODE_PREFIX")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.into()),
            store_timeout: Duration::from_millis(Self::positive(&lookup, "STORE_TIMEOUT_MS", 300)?),
            otp_ttl_register: Self::code_ttl(&lookup, "OTP_TTL_REGISTER_SECS", 600)?,
            otp_ttl_login: Self::code_ttl(&lookup, "OTP_TTL_LOGIN_SECS", 300)?,
            otp_ttl_order: Self::code_ttl(&lookup, "OTP_TTL_ORDER_SECS", 1800)?,
            otp_issue_quota: Self::positive(&lookup, "OTP_ISSUE_QUOTA", 5)?,
            otp_issue_window: Duration::from_secs(Self::positive(
                &lookup,
                "OTP_ISSUE_WINDOW_SECS",
                60,
            )?),
            otp_verify_attempts: Self::positive(&lookup, "OTP_VERIFY_ATTEMPTS", 5)?,
            ttl_backend,
            event_buffer_size: Self::parsed(&lookup, "EVENT_BUFFER_SIZE", 1024)?,
            partition_months_ahead: Self::parsed(&lookup, "PARTITION_MONTHS_AHEAD", 1)?,
            session_ttl_hours: Self::parsed(
                &lookup,
                "SESSION_TTL_HOURS",
                DEFAULT_SESSION_TTL_HOURS,
            )?,
            environment,
        })
    }

    pub fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy {
            register_ttl: self.otp_ttl_register,
            login_ttl: self.otp_ttl_login,
            order_ttl: self.otp_ttl_order,
            issue_limit: RateLimit {
                quota: self.otp_issue_quota,
                window: self.otp_issue_window,
                fail_mode: FailMode::Closed,
            },
            verify_attempts: self.otp_verify_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/tiffin")]))
            .unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.order_code_prefix, "JF");
        assert_eq!(config.store_timeout, Duration::from_millis(300));
        assert_eq!(config.ttl_backend, TtlBackend::Postgres);
        assert!(config.otp_secret.starts_with("dev-OTP_SECRET"));

        let policy = config.otp_policy();
        assert_eq!(policy.order_ttl, Duration::from_secs(1800));
        assert_eq!(policy.issue_limit.quota, 5);
        assert_eq!(policy.issue_limit.fail_mode, FailMode::Closed);
    }

    #[test]
    fn test_missing_database_url() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn test_production_requires_secrets() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/tiffin"),
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "j"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OTP_SECRET"));

        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/tiffin"),
            ("ENVIRONMENT", "production"),
            ("OTP_SECRET", ""),
            ("JWT_SECRET", "j"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_code_ttl_bounds() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/tiffin"),
            ("OTP_TTL_LOGIN_SECS", "60"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OTP_TTL_LOGIN_SECS"));
    }

    #[test]
    fn test_zero_limits_rejected() {
        for name in [
            "STORE_TIMEOUT_MS",
            "OTP_ISSUE_QUOTA",
            "OTP_ISSUE_WINDOW_SECS",
            "OTP_VERIFY_ATTEMPTS",
        ] {
            let err = Config::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://db/tiffin"),
                (name, "0"),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains(name), "{name}: {err}");
            assert!(err.to_string().contains("greater than zero"));
        }
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/tiffin"),
            ("TTL_STORE_BACKEND", "memory"),
            ("ORDER_CODE_PREFIX", "TF"),
            ("OTP_ISSUE_QUOTA", "3"),
            ("STORE_TIMEOUT_MS", "150"),
        ]))
        .unwrap();
        assert_eq!(config.ttl_backend, TtlBackend::Memory);
        assert_eq!(config.order_code_prefix, "TF");
        assert_eq!(config.otp_issue_quota, 3);
        assert_eq!(config.store_timeout, Duration::from_millis(150));

        assert!(
            Config::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://db/tiffin"),
                ("OTP_ISSUE_QUOTA", "many"),
            ]))
            .is_err()
        );
    }
}
