//! Order codes: `<PREFIX>-<ULID>`
//!
//! The ULID is a 48-bit millisecond timestamp followed by 80 random bits,
//! written as 26 Crockford base32 characters. Codes from one generator are
//! strictly increasing: within a millisecond (or when the clock steps back)
//! the previous ULID is incremented, and if that overflows the timestamp
//! moves forward by one.
//!
//! The embedded timestamp becomes the order's `created_at`, so a code alone
//! identifies the monthly partition holding its order.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use thiserror::Error;
use ulid::{Generator, Ulid};

pub const ULID_LEN: usize = ulid::ULID_LEN;
pub const DEFAULT_PREFIX: &str = "JF";
const MAX_PREFIX_LEN: usize = 8;

const TIMESTAMP_MAX: u64 = (1u64 << 48) - 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderCodeError {
    #[error("Order code prefix must be 1-8 uppercase ASCII letters, got {0:?}")]
    InvalidPrefix(String),
    #[error("Malformed order code: {0}")]
    Malformed(String),
    #[error("Order code timestamp out of range: {0}")]
    TimestampOutOfRange(i64),
}

/// Parsed order code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderCode {
    value: String,
    timestamp_ms: i64,
}

impl OrderCode {
    /// Validate `s` and recover its embedded timestamp
    pub fn parse(s: &str) -> Result<Self, OrderCodeError> {
        let malformed = || OrderCodeError::Malformed(s.to_string());
        let (prefix, ulid) = s.split_once('-').ok_or_else(malformed)?;
        validate_prefix(prefix)?;
        let ulid = Ulid::from_string(ulid).map_err(|_| malformed())?;

        Ok(Self::new(prefix, ulid))
    }

    fn new(prefix: &str, ulid: Ulid) -> Self {
        Self {
            // Canonical uppercase form
            value: format!("{prefix}-{ulid}"),
            timestamp_ms: ulid.timestamp_ms() as i64,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Embedded Unix milliseconds
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }
}

impl std::fmt::Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

fn validate_prefix(prefix: &str) -> Result<(), OrderCodeError> {
    let ok = (1..=MAX_PREFIX_LEN).contains(&prefix.len())
        && prefix.bytes().all(|b| b.is_ascii_uppercase());
    if ok {
        Ok(())
    } else {
        Err(OrderCodeError::InvalidPrefix(prefix.to_string()))
    }
}

fn at_millis(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

struct State {
    generator: Generator,
    last_ms: u64,
}

/// Monotonic order code generator
pub struct OrderCodeGenerator {
    prefix: String,
    state: Mutex<State>,
}

impl OrderCodeGenerator {
    pub fn new(prefix: impl Into<String>) -> Result<Self, OrderCodeError> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            prefix,
            state: Mutex::new(State {
                generator: Generator::new(),
                last_ms: 0,
            }),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Code for the current instant
    pub fn generate(&self) -> Result<OrderCode, OrderCodeError> {
        self.generate_at(crate::util::now_millis())
    }

    /// Code for `now_ms`
    ///
    /// The returned code's timestamp is `now_ms` unless an earlier call
    /// already used a later millisecond or exhausted this one.
    pub fn generate_at(&self, now_ms: i64) -> Result<OrderCode, OrderCodeError> {
        let now = u64::try_from(now_ms)
            .ok()
            .filter(|t| *t <= TIMESTAMP_MAX)
            .ok_or(OrderCodeError::TimestampOutOfRange(now_ms))?;

        let mut state = self.state.lock();
        let ulid = match state.generator.generate_from_datetime(at_millis(now)) {
            Ok(ulid) => ulid,
            // Random part exhausted for the last millisecond
            Err(_) => {
                let bumped = now.max(state.last_ms) + 1;
                if bumped > TIMESTAMP_MAX {
                    return Err(OrderCodeError::TimestampOutOfRange(now_ms));
                }
                state
                    .generator
                    .generate_from_datetime(at_millis(bumped))
                    .map_err(|_| OrderCodeError::TimestampOutOfRange(now_ms))?
            }
        };
        state.last_ms = ulid.timestamp_ms();
        drop(state);

        Ok(OrderCode::new(&self.prefix, ulid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // 2026-10-16T12:00:00Z
    const TS: i64 = 1_792_152_000_000;

    #[test]
    fn test_format_and_parse() {
        let generator = OrderCodeGenerator::new("JF").unwrap();
        let code = generator.generate_at(TS).unwrap();

        assert!(code.as_str().starts_with("JF-"));
        assert_eq!(code.as_str().len(), 3 + ULID_LEN);
        assert_eq!(code.timestamp_ms(), TS);

        let parsed = OrderCode::parse(code.as_str()).unwrap();
        assert_eq!(parsed, code);
    }

    #[test]
    fn test_same_millisecond_is_strictly_increasing() {
        let generator = OrderCodeGenerator::new("JF").unwrap();
        let a = generator.generate_at(TS).unwrap();
        let b = generator.generate_at(TS).unwrap();
        assert!(b.as_str() > a.as_str());
        assert_eq!(b.timestamp_ms(), TS);
    }

    #[test]
    fn test_clock_going_back_stays_monotonic() {
        let generator = OrderCodeGenerator::new("JF").unwrap();
        let a = generator.generate_at(TS).unwrap();
        let b = generator.generate_at(TS - 5_000).unwrap();
        assert!(b.as_str() > a.as_str());
        assert_eq!(b.timestamp_ms(), TS);
    }

    #[test]
    fn test_later_codes_sort_later() {
        let generator = OrderCodeGenerator::new("JF").unwrap();
        let a = generator.generate_at(TS).unwrap();
        let other = OrderCodeGenerator::new("JF").unwrap();
        let b = other.generate_at(TS + 1).unwrap();
        assert!(b.as_str() > a.as_str());
    }

    #[test]
    fn test_hundred_thousand_unique_in_one_month() {
        let generator = OrderCodeGenerator::new("JF").unwrap();
        let mut seen = HashSet::with_capacity(100_000);
        let mut previous = String::new();
        for i in 0..100_000i64 {
            // Spread over a few milliseconds, many codes per millisecond
            let code = generator.generate_at(TS + i / 1_000).unwrap();
            assert!(code.as_str() > previous.as_str(), "not increasing at {code}");
            assert!(seen.insert(code.as_str().to_string()), "duplicate {code}");
            previous = code.as_str().to_string();
        }
    }

    #[test]
    fn test_prefix_validation() {
        assert!(OrderCodeGenerator::new("TIFFIN").is_ok());
        for bad in ["", "jf", "J1", "TOOLONGPX", "J-F"] {
            assert!(
                matches!(OrderCodeGenerator::new(bad), Err(OrderCodeError::InvalidPrefix(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let valid = OrderCodeGenerator::new("JF").unwrap().generate_at(TS).unwrap();
        let ulid = &valid.as_str()[3..];

        assert!(OrderCode::parse(ulid).is_err());
        assert!(OrderCode::parse(&format!("jf-{ulid}")).is_err());
        assert!(OrderCode::parse(&format!("JF-{}", &ulid[1..])).is_err());
        assert!(OrderCode::parse(&format!("JF-{}*", &ulid[..25])).is_err());
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let generator = OrderCodeGenerator::new("JF").unwrap();
        assert!(generator.generate_at(-1).is_err());
        assert!(generator.generate_at(1 << 48).is_err());
    }
}
