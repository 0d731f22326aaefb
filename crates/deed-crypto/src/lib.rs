//! Cryptographic primitives for the Deed Ledger.
//!
//! Provides the record hash engine (domain-separated BLAKE3 over a
//! length-prefixed canonical encoding) and pure hash-chain link checking.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod chain;
pub mod hasher;

pub use chain::{LinkChecker, LinkViolation, ViolationKind};
pub use hasher::RecordHasher;
