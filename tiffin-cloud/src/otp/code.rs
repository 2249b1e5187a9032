use rand::Rng;
use rand::rngs::OsRng;
use zeroize::Zeroize;

/// Number of decimal digits in a one-time code
pub const CODE_LEN: usize = 6;

const CODE_SPACE: u32 = 1_000_000;

/// Plaintext one-time code, handed to the caller for delivery
///
/// `Debug` is redacted and there is no `Display`, so the code cannot reach a
/// log line through formatting. The buffer is zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Uniformly random code in `000000..=999999` from the OS RNG
    pub fn generate() -> Self {
        let n: u32 = OsRng.gen_range(0..CODE_SPACE);
        Self(format!("{n:0width$}", width = CODE_LEN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

impl Drop for OtpCode {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Exactly six ASCII digits
pub fn is_well_formed(candidate: &str) -> bool {
    candidate.len() == CODE_LEN && candidate.bytes().all(|b| b.is_ascii_digit())
}
