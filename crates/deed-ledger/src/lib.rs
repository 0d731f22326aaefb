//! Hash-chained ledger engine for the Deed Ledger.
//!
//! This crate is the heart of Deed. It provides:
//! - [`ChainBuilder`]: the append protocol, linearized per chain key by an
//!   in-process lock table and the store's conditional insert, with retry
//! - [`ChainVerifier`]: full-scan verification of links and digests
//! - [`History`]: chain-ordered listings by property or survey number
//! - [`Ledger`]: one facade wiring the above over a shared store
//!
//! Every operation takes a [`Deadline`] that bounds all store calls and lock
//! waits. Expiry surfaces as [`LedgerError::StoreUnavailable`].

pub mod builder;
pub mod config;
pub mod deadline;
pub mod error;
pub mod history;
pub mod ledger;
pub mod locks;
pub mod retry;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use builder::{validate, ChainBuilder};
pub use config::LedgerConfig;
pub use deadline::{Deadline, Expired};
pub use error::{LedgerError, LedgerResult};
pub use history::History;
pub use ledger::Ledger;
pub use locks::{ChainGuard, ChainLocks};
pub use retry::RetryPolicy;
pub use verifier::{ChainVerifier, VerificationResult};
