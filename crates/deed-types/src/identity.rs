use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Identifier grouping records into one hash chain.
///
/// The ledger keys chains by property number; the same key is used for
/// append, verify, and history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainKey(String);

impl ChainKey {
    /// Create a chain key. Surrounding whitespace is trimmed; an empty key is rejected.
    pub fn new(key: impl AsRef<str>) -> Result<Self, TypeError> {
        let key = key.as_ref().trim();
        if key.is_empty() {
            return Err(TypeError::EmptyChainKey);
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChainKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChainKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChainKey> for String {
    fn from(key: ChainKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ChainKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Globally unique record identifier (UUID v7, time-ordered).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Hyphenated lowercase form; this is what the hash engine digests.
    pub fn to_canonical(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_key_trims() {
        let key = ChainKey::new("  PR-001 ").unwrap();
        assert_eq!(key.as_str(), "PR-001");
    }

    #[test]
    fn chain_key_rejects_blank() {
        assert_eq!(ChainKey::new("   ").unwrap_err(), TypeError::EmptyChainKey);
    }

    #[test]
    fn record_ids_are_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn record_id_canonical_is_hyphenated_lowercase() {
        let id = RecordId::generate();
        let s = id.to_canonical();
        assert_eq!(s.len(), 36);
        assert_eq!(s, s.to_lowercase());
        assert_eq!(s.parse::<RecordId>().unwrap(), id);
    }

    #[test]
    fn chain_key_serializes_as_plain_string() {
        let key = ChainKey::new("PR-9").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"PR-9\"");
    }

    #[test]
    fn chain_key_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<ChainKey>("\" \"").is_err());
    }
}
