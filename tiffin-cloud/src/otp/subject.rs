use shared::OtpPurpose;

/// Key under which a live one-time code is stored
///
/// - identity codes: `otp:<purpose>:<identity>`
/// - order codes: `order-otp:<order id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectKey {
    purpose: OtpPurpose,
    key: String,
}

impl SubjectKey {
    pub fn for_identity(purpose: OtpPurpose, identity: &str) -> Self {
        Self {
            purpose,
            key: format!("otp:{purpose}:{identity}"),
        }
    }

    pub fn for_order(order_id: i64) -> Self {
        Self {
            purpose: OtpPurpose::OrderConfirm,
            key: format!("order-otp:{order_id}"),
        }
    }

    pub fn purpose(&self) -> OtpPurpose {
        self.purpose
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}
