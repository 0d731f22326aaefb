use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Creation instant of a record, in milliseconds since the UNIX epoch.
///
/// Digests encode the value as 8 fixed-width big-endian bytes
/// ([`Timestamp::to_be_bytes`]), so every distinct timestamp contributes
/// distinct input bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Bit-exact encoding used by the hash engine.
    pub const fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// The next instant strictly after `self`.
    pub const fn successor(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// A timestamp for a new chain tail: the current time, but never at or
    /// before `tail`.
    pub fn next_after(tail: Option<Timestamp>) -> Self {
        let now = Self::now();
        match tail {
            Some(tail) if now <= tail => tail.successor(),
            _ => now,
        }
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_produces_reasonable_timestamp() {
        // After 2020-01-01 (1577836800000 ms)
        assert!(Timestamp::now().as_millis() > 1_577_836_800_000);
    }

    #[test]
    fn next_after_none_is_now() {
        let before = Timestamp::now();
        let next = Timestamp::next_after(None);
        assert!(next >= before);
    }

    #[test]
    fn next_after_future_tail_is_strictly_later() {
        let tail = Timestamp::from_millis(Timestamp::now().as_millis() + 60_000);
        let next = Timestamp::next_after(Some(tail));
        assert_eq!(next, tail.successor());
        assert!(next > tail);
    }

    #[test]
    fn next_after_past_tail_uses_clock() {
        let tail = Timestamp::from_millis(1_000);
        let next = Timestamp::next_after(Some(tail));
        assert!(next.as_millis() > 1_577_836_800_000);
    }

    #[test]
    fn distinct_values_have_distinct_bytes() {
        let a = Timestamp::from_millis(1_700_000_000_000);
        let b = Timestamp::from_millis(1_700_000_000_001);
        assert_ne!(a.to_be_bytes(), b.to_be_bytes());
    }

    #[test]
    fn successor_saturates() {
        let max = Timestamp::from_millis(i64::MAX);
        assert_eq!(max.successor(), max);
    }

    #[test]
    fn serializes_as_number() {
        let ts = Timestamp::from_millis(42);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
    }
}
