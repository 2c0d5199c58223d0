//! Nanosecond timestamp handling
//!
//! Span timestamps arrive as decimal-string-encoded nanoseconds since the
//! Unix epoch. Their precision exceeds what an f64 can represent, so they
//! are parsed into a 128-bit integer and compared as integers end to end.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Nanoseconds since the Unix epoch, 128-bit safe.
///
/// Serializes as a decimal string so no precision is lost crossing the
/// JSON boundary; accepts either a string or an integer on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnixNanos(pub i128);

impl UnixNanos {
    pub fn as_i128(&self) -> i128 {
        self.0
    }

    /// Difference to `earlier` in seconds.
    pub fn secs_since(&self, earlier: UnixNanos) -> f64 {
        (self.0 - earlier.0) as f64 / 1e9
    }

    /// Best-effort conversion for logging; falls back to the epoch outside
    /// chrono's representable range.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let secs = (self.0 / 1_000_000_000) as i64;
        let nsecs = (self.0 % 1_000_000_000).unsigned_abs() as u32;
        DateTime::from_timestamp(secs, nsecs).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

impl fmt::Display for UnixNanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UnixNanos {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i128>().map(UnixNanos)
    }
}

impl From<i128> for UnixNanos {
    fn from(v: i128) -> Self {
        UnixNanos(v)
    }
}

impl From<u64> for UnixNanos {
    fn from(v: u64) -> Self {
        UnixNanos(v as i128)
    }
}

impl Serialize for UnixNanos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct UnixNanosVisitor;

impl Visitor<'_> for UnixNanosVisitor {
    type Value = UnixNanos;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal string or integer nanosecond timestamp")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse()
            .map_err(|_| E::custom(format!("invalid nanosecond timestamp: {}", v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(UnixNanos(v as i128))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(UnixNanos(v as i128))
    }
}

impl<'de> Deserialize<'de> for UnixNanos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UnixNanosVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_decimal_string() {
        let ns: UnixNanos = "1704067200000000000".parse().unwrap();
        assert_eq!(ns.0, 1_704_067_200_000_000_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-number".parse::<UnixNanos>().is_err());
        assert!("1.5e9".parse::<UnixNanos>().is_err());
    }

    #[test]
    fn test_precision_beyond_f64() {
        // Adjacent nanosecond values at 2^53 must stay distinct
        let a: UnixNanos = "9007199254740992".parse().unwrap();
        let b: UnixNanos = "9007199254740993".parse().unwrap();
        assert_ne!(a, b);
        assert!(a < b);
        // The same two values collapse under f64 (2^53 + 1 rounds down)
        assert_eq!(9007199254740992_f64, 9007199254740993_f64);
    }

    #[test]
    fn test_display_roundtrip() {
        let ns = UnixNanos(1_500_000_000);
        assert_eq!(ns.to_string().parse::<UnixNanos>().unwrap(), ns);
    }

    #[test]
    fn test_serde_string_roundtrip() {
        let ns = UnixNanos(1_704_067_200_000_000_001);
        let json = serde_json::to_string(&ns).unwrap();
        assert_eq!(json, "\"1704067200000000001\"");
        let back: UnixNanos = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ns);
    }

    #[test]
    fn test_serde_accepts_integer() {
        let ns: UnixNanos = serde_json::from_str("1500000000").unwrap();
        assert_eq!(ns.0, 1_500_000_000);
    }

    #[test]
    fn test_secs_since() {
        let start = UnixNanos(1_000_000_000);
        let end = UnixNanos(2_500_000_000);
        assert!((end.secs_since(start) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_to_datetime() {
        let ns = UnixNanos(1_704_067_200_000_000_000);
        let dt = ns.to_datetime();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 1);
    }
}
