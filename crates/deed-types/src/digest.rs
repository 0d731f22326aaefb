use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Reserved predecessor value marking the first record of a chain.
pub const GENESIS: &str = "genesis";

/// A 256-bit record digest.
///
/// Stored, compared, and serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap a pre-computed hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_hex()
    }
}

/// The predecessor link carried by every record.
///
/// Either the [`GENESIS`] sentinel (first record of a chain) or the digest of
/// the chain's tail at the moment of append.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrevHash {
    Genesis,
    Digest(Digest),
}

impl PrevHash {
    pub fn is_genesis(&self) -> bool {
        matches!(self, Self::Genesis)
    }

    /// The linked digest, `None` for genesis.
    pub fn digest(&self) -> Option<Digest> {
        match self {
            Self::Genesis => None,
            Self::Digest(d) => Some(*d),
        }
    }

    /// The textual form fed to the hash engine and stored on the wire.
    pub fn as_text(&self) -> String {
        match self {
            Self::Genesis => GENESIS.to_string(),
            Self::Digest(d) => d.to_hex(),
        }
    }
}

impl Default for PrevHash {
    fn default() -> Self {
        Self::Genesis
    }
}

impl From<Digest> for PrevHash {
    fn from(digest: Digest) -> Self {
        Self::Digest(digest)
    }
}

impl From<Option<Digest>> for PrevHash {
    fn from(digest: Option<Digest>) -> Self {
        digest.map_or(Self::Genesis, Self::Digest)
    }
}

impl fmt::Debug for PrevHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Genesis => f.write_str("PrevHash(genesis)"),
            Self::Digest(d) => write!(f, "PrevHash({})", d.short_hex()),
        }
    }
}

impl fmt::Display for PrevHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl FromStr for PrevHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == GENESIS {
            Ok(Self::Genesis)
        } else {
            Digest::from_hex(s).map(Self::Digest)
        }
    }
}

impl TryFrom<String> for PrevHash {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PrevHash> for String {
    fn from(prev: PrevHash) -> Self {
        prev.as_text()
    }
}
