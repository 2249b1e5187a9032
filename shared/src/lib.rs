//! Shared types for Tiffin services
//!
//! Common types used across crates: error codes and the unified error
//! response, order records and lifecycle events, and one-time code purposes.

pub mod error;
pub mod order;
pub mod otp;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use order::{LifecycleEvent, LifecycleEventType, LineItem, Order, OrderStatus};
pub use otp::OtpPurpose;
