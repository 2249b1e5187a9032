use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Size of a stored code hash
pub const DIGEST_LEN: usize = 32;

/// HMAC-SHA256 of one-time codes under a server secret
///
/// The secret is zeroed when the hasher is dropped.
pub struct OtpHasher {
    secret: Zeroizing<Vec<u8>>,
}

impl OtpHasher {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    fn keyed(&self) -> HmacSha256 {
        match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC accepts keys of any length"),
        }
    }

    pub fn digest(&self, code: &str) -> [u8; DIGEST_LEN] {
        let mut mac = self.keyed();
        mac.update(code.as_bytes());
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }

    /// Constant-time comparison of `HMAC(code)` against a stored digest
    pub fn matches(&self, code: &str, expected: &[u8]) -> bool {
        let mut mac = self.keyed();
        mac.update(code.as_bytes());
        mac.verify_slice(expected).is_ok()
    }
}

impl std::fmt::Debug for OtpHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpHasher").finish_non_exhaustive()
    }
}
