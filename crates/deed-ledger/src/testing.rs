//! Store wrappers and fixtures for ledger tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use deed_crypto::RecordHasher;
use deed_store::{InMemoryRecordStore, RecordStore, StoreError, StoreResult};
use deed_types::{Action, ChainKey, LedgerRecord, PrevHash, RecordFields, RecordId};

pub(crate) fn key(s: &str) -> ChainKey {
    ChainKey::new(s).unwrap()
}

pub(crate) fn fields(property: &str, action: Action) -> RecordFields {
    RecordFields {
        survey_number: "SV-100".into(),
        property_number: property.into(),
        owner_id: "OWN-1".into(),
        land_type: "agricultural".into(),
        action,
        details: format!("{action} for {property}"),
    }
}

/// Delays every read after it has been served, so the caller holds a stale
/// view of the chain for `delay` before it can write.
///
/// Counts conditional inserts rejected because the tail moved.
pub(crate) struct SlowStore {
    inner: InMemoryRecordStore,
    delay: Duration,
    conflicts: AtomicUsize,
}

impl SlowStore {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            delay,
            conflicts: AtomicUsize::new(0),
        }
    }

    /// Conditional inserts that lost a race so far.
    pub(crate) fn conflicts(&self) -> usize {
        self.conflicts.load(Ordering::SeqCst)
    }

    async fn stall<T>(&self, read: StoreResult<T>) -> StoreResult<T> {
        tokio::time::sleep(self.delay).await;
        read
    }
}

#[async_trait]
impl RecordStore for SlowStore {
    async fn find_by_chain_key(&self, key: &ChainKey) -> StoreResult<Vec<LedgerRecord>> {
        let read = self.inner.find_by_chain_key(key).await;
        self.stall(read).await
    }

    async fn find_by_survey(&self, survey_number: &str) -> StoreResult<Vec<LedgerRecord>> {
        let read = self.inner.find_by_survey(survey_number).await;
        self.stall(read).await
    }

    async fn insert(&self, record: &LedgerRecord) -> StoreResult<()> {
        self.inner.insert(record).await
    }

    async fn insert_if_tail(&self, record: &LedgerRecord, expected_tail: &PrevHash) -> StoreResult<()> {
        let result = self.inner.insert_if_tail(record, expected_tail).await;
        if matches!(result, Err(StoreError::TailMoved { .. })) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }
        result
    }

    async fn tail(&self, key: &ChainKey) -> StoreResult<Option<LedgerRecord>> {
        let read = self.inner.tail(key).await;
        self.stall(read).await
    }

    async fn len(&self) -> StoreResult<usize> {
        self.inner.len().await
    }
}

/// Fails the first `failures` reads with [`StoreError::Unavailable`].
pub(crate) struct FlakyStore {
    inner: InMemoryRecordStore,
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub(crate) fn failing_first(failures: usize) -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of reads attempted so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn gate(&self) -> StoreResult<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn find_by_chain_key(&self, key: &ChainKey) -> StoreResult<Vec<LedgerRecord>> {
        self.gate()?;
        self.inner.find_by_chain_key(key).await
    }

    async fn find_by_survey(&self, survey_number: &str) -> StoreResult<Vec<LedgerRecord>> {
        self.gate()?;
        self.inner.find_by_survey(survey_number).await
    }

    async fn insert(&self, record: &LedgerRecord) -> StoreResult<()> {
        self.inner.insert(record).await
    }

    async fn insert_if_tail(&self, record: &LedgerRecord, expected_tail: &PrevHash) -> StoreResult<()> {
        self.inner.insert_if_tail(record, expected_tail).await
    }

    async fn tail(&self, key: &ChainKey) -> StoreResult<Option<LedgerRecord>> {
        self.gate()?;
        self.inner.tail(key).await
    }

    async fn len(&self) -> StoreResult<usize> {
        self.inner.len().await
    }
}

/// Simulates a writer in another process: on the first conditional insert,
/// a competing record lands on the same chain just before the caller's write.
pub(crate) struct RacingStore {
    inner: InMemoryRecordStore,
    competitor: Mutex<Option<LedgerRecord>>,
}

impl RacingStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            competitor: Mutex::new(None),
        }
    }

    pub(crate) fn competitor(&self) -> Option<LedgerRecord> {
        self.competitor.lock().unwrap().clone()
    }

    fn competing_record(record: &LedgerRecord, expected_tail: &PrevHash) -> LedgerRecord {
        let mut fields = record.fields();
        fields.details = "written by another process".into();
        let id = RecordId::generate();
        let hash = RecordHasher::RECORD.digest(&id, &fields, record.timestamp, expected_tail);
        LedgerRecord::from_parts(id, fields, record.timestamp, *expected_tail, hash)
    }
}

#[async_trait]
impl RecordStore for RacingStore {
    async fn find_by_chain_key(&self, key: &ChainKey) -> StoreResult<Vec<LedgerRecord>> {
        self.inner.find_by_chain_key(key).await
    }

    async fn find_by_survey(&self, survey_number: &str) -> StoreResult<Vec<LedgerRecord>> {
        self.inner.find_by_survey(survey_number).await
    }

    async fn insert(&self, record: &LedgerRecord) -> StoreResult<()> {
        self.inner.insert(record).await
    }

    async fn insert_if_tail(&self, record: &LedgerRecord, expected_tail: &PrevHash) -> StoreResult<()> {
        let competing = {
            let mut slot = self.competitor.lock().unwrap();
            if slot.is_none() {
                let competing = Self::competing_record(record, expected_tail);
                *slot = Some(competing.clone());
                Some(competing)
            } else {
                None
            }
        };
        if let Some(competing) = competing {
            self.inner.insert_if_tail(&competing, expected_tail).await?;
        }
        self.inner.insert_if_tail(record, expected_tail).await
    }

    async fn tail(&self, key: &ChainKey) -> StoreResult<Option<LedgerRecord>> {
        self.inner.tail(key).await
    }

    async fn len(&self) -> StoreResult<usize> {
        self.inner.len().await
    }
}
