//! In-memory chain index shared by the store backends.

use std::collections::HashMap;

use deed_types::{ChainKey, LedgerRecord, PrevHash, RecordId};

use crate::error::{StoreError, StoreResult};

/// Records grouped by chain key, plus an id index for duplicate detection.
///
/// Each chain's tail is cached so a conditional insert does not rescan the
/// chain.
#[derive(Default)]
pub(crate) struct ChainIndex {
    chains: HashMap<ChainKey, Chain>,
    ids: HashMap<RecordId, ChainKey>,
}

#[derive(Default)]
struct Chain {
    records: Vec<LedgerRecord>,
    tail: Option<usize>,
}

impl Chain {
    fn tail_record(&self) -> Option<&LedgerRecord> {
        self.tail.map(|i| &self.records[i])
    }

    fn recompute_tail(&mut self) {
        self.tail = self
            .records
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| LedgerRecord::chain_order(a, b))
            .map(|(i, _)| i);
    }
}

impl ChainIndex {
    pub(crate) fn chain_key_of(record: &LedgerRecord) -> StoreResult<ChainKey> {
        ChainKey::new(&record.property_number)
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))
    }

    pub(crate) fn find_by_chain_key(&self, key: &ChainKey) -> Vec<LedgerRecord> {
        self.chains
            .get(key)
            .map(|chain| chain.records.clone())
            .unwrap_or_default()
    }

    pub(crate) fn find_by_survey(&self, survey_number: &str) -> Vec<LedgerRecord> {
        let survey_number = survey_number.trim();
        self.chains
            .values()
            .flat_map(|chain| chain.records.iter())
            .filter(|r| r.survey_number.trim() == survey_number)
            .cloned()
            .collect()
    }

    pub(crate) fn tail(&self, key: &ChainKey) -> Option<LedgerRecord> {
        self.chains
            .get(key)
            .and_then(Chain::tail_record)
            .cloned()
    }

    pub(crate) fn tail_link(&self, key: &ChainKey) -> PrevHash {
        PrevHash::from(
            self.chains
                .get(key)
                .and_then(Chain::tail_record)
                .map(|r| r.hash),
        )
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check every precondition of an insert without applying it.
    pub(crate) fn check_insert(
        &self,
        record: &LedgerRecord,
        expected_tail: Option<&PrevHash>,
    ) -> StoreResult<ChainKey> {
        let key = Self::chain_key_of(record)?;
        if self.ids.contains_key(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        if let Some(expected) = expected_tail {
            let actual = self.tail_link(&key);
            if actual != *expected {
                return Err(StoreError::TailMoved {
                    chain_key: key,
                    expected: *expected,
                    actual,
                });
            }
        }
        Ok(key)
    }

    /// Apply an insert whose preconditions were checked by `check_insert`.
    pub(crate) fn apply_insert(&mut self, key: ChainKey, record: LedgerRecord) {
        self.ids.insert(record.id, key.clone());
        let chain = self.chains.entry(key).or_default();
        let is_new_tail = chain
            .tail_record()
            .map_or(true, |tail| LedgerRecord::chain_order(&record, tail).is_ge());
        chain.records.push(record);
        if is_new_tail {
            chain.tail = Some(chain.records.len() - 1);
        }
    }

    pub(crate) fn insert(
        &mut self,
        record: LedgerRecord,
        expected_tail: Option<&PrevHash>,
    ) -> StoreResult<()> {
        let key = self.check_insert(&record, expected_tail)?;
        self.apply_insert(key, record);
        Ok(())
    }

    /// Replace the stored record with the same id. Returns `false` if no
    /// such record exists or the replacement moves it to another chain.
    pub(crate) fn overwrite(&mut self, record: LedgerRecord) -> bool {
        let Some(key) = self.ids.get(&record.id) else {
            return false;
        };
        if !record.belongs_to(key) {
            return false;
        }
        let Some(chain) = self.chains.get_mut(key) else {
            return false;
        };
        let Some(slot) = chain.records.iter_mut().find(|r| r.id == record.id) else {
            return false;
        };
        *slot = record;
        chain.recompute_tail();
        true
    }
}
