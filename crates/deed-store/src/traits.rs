use async_trait::async_trait;
use deed_types::{ChainKey, LedgerRecord, PrevHash};

use crate::error::StoreResult;

/// Persistent record store consumed by the ledger engine.
///
/// All implementations must satisfy these invariants:
/// - Records are immutable once written.
/// - `insert` and `insert_if_tail` reject a record whose id already exists
///   with [`StoreError::DuplicateId`](crate::StoreError::DuplicateId).
/// - `insert_if_tail` is atomic with respect to every other write on the same
///   chain key.
/// - Reads return a consistent snapshot; ordering is not guaranteed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records whose property number equals `key`, in any order.
    async fn find_by_chain_key(&self, key: &ChainKey) -> StoreResult<Vec<LedgerRecord>>;

    /// All records carrying `survey_number`, in any order, across chains.
    async fn find_by_survey(&self, survey_number: &str) -> StoreResult<Vec<LedgerRecord>>;

    /// Persist `record` unconditionally (duplicate ids are still rejected).
    async fn insert(&self, record: &LedgerRecord) -> StoreResult<()>;

    /// Persist `record` only if the current tail of its chain is
    /// `expected_tail` (`PrevHash::Genesis` for an empty chain).
    ///
    /// Returns [`StoreError::TailMoved`](crate::StoreError::TailMoved) when
    /// another writer appended first.
    async fn insert_if_tail(&self, record: &LedgerRecord, expected_tail: &PrevHash)
        -> StoreResult<()>;

    /// The newest record of a chain (max timestamp, ties by id).
    ///
    /// Default implementation scans the chain. Backends with an index may
    /// override.
    async fn tail(&self, key: &ChainKey) -> StoreResult<Option<LedgerRecord>> {
        let records = self.find_by_chain_key(key).await?;
        Ok(records.into_iter().max_by(LedgerRecord::chain_order))
    }

    /// Total number of stored records.
    async fn len(&self) -> StoreResult<usize>;
}
