//! Foundation types for the Deed Ledger.
//!
//! This crate provides the record, identity, digest, and temporal types shared
//! by every other Deed crate.
//!
//! # Key Types
//!
//! - [`LedgerRecord`] -- An immutable, hash-linked land-ownership event
//! - [`RecordFields`] -- The caller-supplied semantic fields of a record
//! - [`ChainKey`] -- Identifier grouping records into one hash chain
//! - [`RecordId`] -- UUID v7 record identifier
//! - [`Digest`] / [`PrevHash`] -- BLAKE3 digest and the predecessor link
//! - [`Timestamp`] -- Millisecond creation instant
//! - [`Action`] -- Closed set of ledger actions

pub mod action;
pub mod digest;
pub mod error;
pub mod identity;
pub mod record;
pub mod temporal;

pub use action::Action;
pub use digest::{Digest, PrevHash, GENESIS};
pub use error::TypeError;
pub use identity::{ChainKey, RecordId};
pub use record::{LedgerRecord, RecordFields};
pub use temporal::Timestamp;
