//! Record storage for the Deed Ledger.
//!
//! The ledger engine treats storage as an external collaborator reached
//! through the [`RecordStore`] trait. Records are grouped by [`ChainKey`]
//! (property number) and can also be listed by survey number.
//!
//! # Storage Backends
//!
//! - [`InMemoryRecordStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileRecordStore`] -- append-only journal file with CRC32 framing
//!
//! # Design Rules
//!
//! 1. Records are immutable once written; the only in-place rewrite is the
//!    explicit [`InMemoryRecordStore::overwrite`] hook for integrity tooling.
//! 2. Duplicate record ids are always rejected.
//! 3. [`RecordStore::insert_if_tail`] is an atomic compare-and-swap on the
//!    chain tail; it is what keeps chains from forking across writers.
//! 4. Concurrent reads are always safe.
//! 5. All I/O errors are propagated, never silently ignored.
//!
//! [`ChainKey`]: deed_types::ChainKey

pub mod error;
mod index;
pub mod journal;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use journal::{FileRecordStore, JournalConfig, SyncMode};
pub use memory::InMemoryRecordStore;
pub use traits::RecordStore;
