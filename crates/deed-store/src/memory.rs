use std::sync::RwLock;

use async_trait::async_trait;
use deed_types::{ChainKey, LedgerRecord, PrevHash};
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::index::ChainIndex;
use crate::traits::RecordStore;

/// In-memory, HashMap-based record store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock`,
/// grouped by chain key, with each chain's tail cached so tail lookups touch
/// only that chain. Records are cloned on read/write.
pub struct InMemoryRecordStore {
    index: RwLock<ChainIndex>,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            index: RwLock::new(ChainIndex::default()),
        }
    }

    /// Number of records currently stored.
    pub fn record_count(&self) -> usize {
        self.index.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Replace a stored record in place, bypassing every chain check.
    ///
    /// Records are immutable under the ledger's own write path; this hook
    /// exists so integrity tooling can be exercised against tampered data.
    /// Returns `false` if no record with the same id exists in the same chain.
    pub fn overwrite(&self, record: LedgerRecord) -> bool {
        let id = record.id;
        let replaced = self.index.write().expect("lock poisoned").overwrite(record);
        if replaced {
            warn!(record_id = %id, "stored record overwritten out of band");
        }
        replaced
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_by_chain_key(&self, key: &ChainKey) -> StoreResult<Vec<LedgerRecord>> {
        Ok(self.index.read().expect("lock poisoned").find_by_chain_key(key))
    }

    async fn find_by_survey(&self, survey_number: &str) -> StoreResult<Vec<LedgerRecord>> {
        Ok(self
            .index
            .read()
            .expect("lock poisoned")
            .find_by_survey(survey_number))
    }

    async fn insert(&self, record: &LedgerRecord) -> StoreResult<()> {
        self.index
            .write()
            .expect("lock poisoned")
            .insert(record.clone(), None)?;
        debug!(record_id = %record.id, chain_key = %record.property_number, "record inserted");
        Ok(())
    }

    async fn insert_if_tail(
        &self,
        record: &LedgerRecord,
        expected_tail: &PrevHash,
    ) -> StoreResult<()> {
        self.index
            .write()
            .expect("lock poisoned")
            .insert(record.clone(), Some(expected_tail))?;
        debug!(record_id = %record.id, chain_key = %record.property_number, "record appended");
        Ok(())
    }

    async fn tail(&self, key: &ChainKey) -> StoreResult<Option<LedgerRecord>> {
        Ok(self.index.read().expect("lock poisoned").tail(key))
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.record_count())
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &self.record_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use deed_crypto::RecordHasher;
    use deed_types::{Action, RecordFields, RecordId, Timestamp};

    fn make_record(property: &str, survey: &str, ts: i64, prev: PrevHash) -> LedgerRecord {
        let fields = RecordFields {
            survey_number: survey.into(),
            property_number: property.into(),
            owner_id: "OWN-1".into(),
            land_type: "residential".into(),
            action: Action::AwardDeclared,
            details: String::new(),
        };
        let id = RecordId::generate();
        let ts = Timestamp::from_millis(ts);
        let hash = RecordHasher::RECORD.digest(&id, &fields, ts, &prev);
        LedgerRecord::from_parts(id, fields, ts, prev, hash)
    }

    fn key(s: &str) -> ChainKey {
        ChainKey::new(s).unwrap()
    }

    // -----------------------------------------------------------------------
    // Core reads and writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn insert_and_find_by_chain_key() {
        let store = InMemoryRecordStore::new();
        let r = make_record("PR-1", "SV-1", 1, PrevHash::Genesis);
        store.insert(&r).await.unwrap();

        let found = store.find_by_chain_key(&key("PR-1")).await.unwrap();
        assert_eq!(found, vec![r]);
        assert!(store.find_by_chain_key(&key("PR-2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_survey_crosses_chains() {
        let store = InMemoryRecordStore::new();
        store.insert(&make_record("PR-1", "SV-9", 1, PrevHash::Genesis)).await.unwrap();
        store.insert(&make_record("PR-2", "SV-9", 2, PrevHash::Genesis)).await.unwrap();
        store.insert(&make_record("PR-3", "SV-1", 3, PrevHash::Genesis)).await.unwrap();

        let found = store.find_by_survey("SV-9").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.survey_number == "SV-9"));
    }

    #[tokio::test]
    async fn duplicate_id_rejected() {
        let store = InMemoryRecordStore::new();
        let r = make_record("PR-1", "SV-1", 1, PrevHash::Genesis);
        store.insert(&r).await.unwrap();
        let err = store.insert(&r).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == r.id));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_property_number_rejected() {
        let store = InMemoryRecordStore::new();
        let r = make_record("  ", "SV-1", 1, PrevHash::Genesis);
        let err = store.insert(&r).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }

    // -----------------------------------------------------------------------
    // Conditional insert
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn insert_if_tail_accepts_matching_tail() {
        let store = InMemoryRecordStore::new();
        let first = make_record("PR-1", "SV-1", 1, PrevHash::Genesis);
        store.insert_if_tail(&first, &PrevHash::Genesis).await.unwrap();

        let second = make_record("PR-1", "SV-1", 2, first.hash.into());
        store.insert_if_tail(&second, &first.hash.into()).await.unwrap();

        let tail = store.tail(&key("PR-1")).await.unwrap().unwrap();
        assert_eq!(tail.id, second.id);
    }

    #[tokio::test]
    async fn insert_if_tail_rejects_stale_tail() {
        let store = InMemoryRecordStore::new();
        let first = make_record("PR-1", "SV-1", 1, PrevHash::Genesis);
        store.insert_if_tail(&first, &PrevHash::Genesis).await.unwrap();

        // A second writer still believes the chain is empty.
        let racer = make_record("PR-1", "SV-1", 2, PrevHash::Genesis);
        let err = store.insert_if_tail(&racer, &PrevHash::Genesis).await.unwrap_err();
        match err {
            StoreError::TailMoved { expected, actual, .. } => {
                assert_eq!(expected, PrevHash::Genesis);
                assert_eq!(actual, PrevHash::Digest(first.hash));
            }
            other => panic!("expected TailMoved, got {other}"),
        }
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn chains_are_independent() {
        let store = InMemoryRecordStore::new();
        store
            .insert_if_tail(&make_record("PR-1", "SV-1", 1, PrevHash::Genesis), &PrevHash::Genesis)
            .await
            .unwrap();
        store
            .insert_if_tail(&make_record("PR-2", "SV-1", 1, PrevHash::Genesis), &PrevHash::Genesis)
            .await
            .unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn tail_of_empty_chain_is_none() {
        let store = InMemoryRecordStore::new();
        assert!(store.tail(&key("nothing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tail_tracks_max_timestamp_not_insert_order() {
        let store = InMemoryRecordStore::new();
        let late = make_record("PR-1", "SV-1", 50, PrevHash::Genesis);
        let early = make_record("PR-1", "SV-1", 10, PrevHash::Genesis);
        store.insert(&late).await.unwrap();
        store.insert(&early).await.unwrap();
        assert_eq!(store.tail(&key("PR-1")).await.unwrap().unwrap().id, late.id);
    }

    // -----------------------------------------------------------------------
    // Out-of-band overwrite
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn overwrite_replaces_in_place() {
        let store = InMemoryRecordStore::new();
        let r = make_record("PR-1", "SV-1", 1, PrevHash::Genesis);
        store.insert(&r).await.unwrap();

        let mut edited = r.clone();
        edited.details = "edited".into();
        assert!(store.overwrite(edited));

        let found = store.find_by_chain_key(&key("PR-1")).await.unwrap();
        assert_eq!(found[0].details, "edited");
        assert_eq!(found[0].hash, r.hash);
    }

    #[tokio::test]
    async fn overwrite_unknown_id_is_refused() {
        let store = InMemoryRecordStore::new();
        assert!(!store.overwrite(make_record("PR-1", "SV-1", 1, PrevHash::Genesis)));
    }

    #[tokio::test]
    async fn overwrite_cannot_move_record_between_chains() {
        let store = InMemoryRecordStore::new();
        let r = make_record("PR-1", "SV-1", 1, PrevHash::Genesis);
        store.insert(&r).await.unwrap();
        let mut moved = r.clone();
        moved.property_number = "PR-2".into();
        assert!(!store.overwrite(moved));
    }

    #[tokio::test]
    async fn overwrite_timestamp_updates_tail() {
        let store = InMemoryRecordStore::new();
        let a = make_record("PR-1", "SV-1", 1, PrevHash::Genesis);
        let b = make_record("PR-1", "SV-1", 2, a.hash.into());
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        let mut edited = a.clone();
        edited.timestamp = Timestamp::from_millis(99);
        assert!(store.overwrite(edited));
        assert_eq!(store.tail(&key("PR-1")).await.unwrap().unwrap().id, a.id);
    }

    #[test]
    fn debug_shows_count() {
        let store = InMemoryRecordStore::new();
        assert!(store.is_empty());
        assert_eq!(format!("{store:?}"), "InMemoryRecordStore { record_count: 0 }");
    }
}
