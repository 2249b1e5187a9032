//! One-time code purposes

use serde::{Deserialize, Serialize};

/// What a one-time code authorizes
///
/// The purpose is part of every code's key, so one identity can hold a live
/// registration, login and order-confirmation code at the same time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OtpPurpose {
    Register,
    Login,
    OrderConfirm,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::OrderConfirm => "order-confirm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "register" => Some(Self::Register),
            "login" => Some(Self::Login),
            "order-confirm" => Some(Self::OrderConfirm),
            _ => None,
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
