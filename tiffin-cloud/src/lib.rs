//! tiffin-cloud: OTP-gated order confirmation
//!
//! Brokers trust between a buyer and a food provider with a short-lived
//! one-time code as the only confirmation mechanism.
//!
//! # Modules
//!
//! ```text
//! tiffin-cloud/src/
//! ├── ttl/          # Key/value store with per-key expiry (Postgres, memory)
//! ├── rate_limit.rs # Fixed-window counters in front of issue and verify
//! ├── otp/          # Code generation, HMAC hashing, issue/verify/invalidate
//! ├── orders/       # Order codes, stores, partitions, lifecycle controller
//! ├── events/       # Append-only lifecycle event log
//! ├── auth/         # Session tokens minted by login codes
//! ├── config.rs     # Environment configuration
//! ├── state.rs      # Service wiring
//! └── error.rs      # Conversions into shared::error::AppError
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod orders;
pub mod otp;
pub mod rate_limit;
pub mod state;
pub mod ttl;
pub mod util;

pub use config::Config;
pub use state::AppState;
