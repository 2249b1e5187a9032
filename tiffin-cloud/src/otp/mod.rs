//! One-time codes
//!
//! ```text
//! issue_code ──▶ issuance limiter (fail closed) ──▶ issue ──▶ TTL store: SET key HMAC(code) EX ttl
//! verify_code ─▶ attempt limiter (fail open) ───▶ verify ─▶ GET, constant-time compare, compare-and-delete
//! ```
//!
//! Plaintext codes exist only in the [`OtpCode`] returned to the caller.

mod code;
mod hasher;
mod manager;
mod subject;

pub use code::{CODE_LEN, OtpCode, is_well_formed};
pub use hasher::{DIGEST_LEN, OtpHasher};
pub use manager::{OtpError, OtpManager, OtpPolicy, OtpReceipt};
pub use subject::SubjectKey;
