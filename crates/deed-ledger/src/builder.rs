use std::sync::Arc;

use deed_crypto::RecordHasher;
use deed_store::RecordStore;
use deed_types::{ChainKey, LedgerRecord, PrevHash, RecordFields, RecordId, Timestamp};
use tracing::{debug, warn};

use crate::deadline::Deadline;
use crate::error::{AttemptError, LedgerError, LedgerResult};
use crate::locks::ChainLocks;
use crate::retry::RetryPolicy;

/// Appends records to hash chains.
///
/// The read-tail / compute / write cycle of one chain key is linearized two
/// ways:
/// - appends through the same [`ChainLocks`] queue behind a per-key mutex, so
///   builders sharing a lock table never race each other;
/// - the final write is [`RecordStore::insert_if_tail`], which re-validates
///   the tail at write time. A writer outside the lock table (another process,
///   another builder) that appended first makes the write fail with a
///   conflict, and the whole cycle is retried against the new tail.
///
/// Appends to different keys share nothing but the store.
pub struct ChainBuilder {
    store: Arc<dyn RecordStore>,
    locks: Arc<ChainLocks>,
    retry: RetryPolicy,
    hasher: RecordHasher,
}

impl ChainBuilder {
    pub fn new(store: Arc<dyn RecordStore>, retry: RetryPolicy) -> Self {
        Self::with_locks(store, Arc::new(ChainLocks::new()), retry)
    }

    /// Build on a shared lock table.
    pub fn with_locks(store: Arc<dyn RecordStore>, locks: Arc<ChainLocks>, retry: RetryPolicy) -> Self {
        Self {
            store,
            locks,
            retry: retry.normalized(),
            hasher: RecordHasher::RECORD,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Append a record to the chain identified by `key`.
    ///
    /// `fields.property_number` must equal `key`. The record's id, timestamp,
    /// `prev_hash`, and `hash` are assigned here.
    pub async fn append(
        &self,
        key: &ChainKey,
        fields: RecordFields,
        deadline: Deadline,
    ) -> LedgerResult<LedgerRecord> {
        validate(key, &fields)?;

        let _guard = self
            .locks
            .acquire(key, deadline)
            .await
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?;

        let mut attempt = 0;
        loop {
            let failure = match self.try_append(key, &fields, deadline).await {
                Ok(record) => {
                    debug!(
                        chain_key = %key,
                        record_id = %record.id,
                        prev_hash = %record.prev_hash,
                        attempt,
                        "record appended"
                    );
                    return Ok(record);
                }
                Err(failure) => failure,
            };

            attempt += 1;
            if !failure.is_retryable() || attempt >= self.retry.max_attempts {
                warn!(chain_key = %key, attempt, error = ?failure, "append failed");
                return Err(failure.into_ledger_error());
            }

            let delay = self.retry.next_delay(attempt - 1);
            if delay >= deadline.remaining() {
                warn!(chain_key = %key, attempt, error = ?failure, "append deadline exhausted");
                return Err(failure.into_ledger_error());
            }

            match &failure {
                AttemptError::ChainConflict(e) => {
                    debug!(chain_key = %key, attempt, error = %e, "tail moved; retrying append")
                }
                other => {
                    warn!(chain_key = %key, attempt, error = ?other, "store failure; retrying append")
                }
            }
            tokio::time::sleep(delay).await;
        }
    }

    async fn try_append(
        &self,
        key: &ChainKey,
        fields: &RecordFields,
        deadline: Deadline,
    ) -> Result<LedgerRecord, AttemptError> {
        let tail = deadline
            .bound("tail lookup", self.store.tail(key))
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))??;

        let prev_hash = PrevHash::from(tail.as_ref().map(|t| t.hash));
        let timestamp = Timestamp::next_after(tail.as_ref().map(|t| t.timestamp));
        let id = RecordId::generate();
        let hash = self.hasher.digest(&id, fields, timestamp, &prev_hash);
        let record = LedgerRecord::from_parts(id, fields.clone(), timestamp, prev_hash, hash);

        deadline
            .bound("record insert", self.store.insert_if_tail(&record, &prev_hash))
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))??;

        Ok(record)
    }
}

/// Reject blank required fields and records addressed to the wrong chain.
pub fn validate(key: &ChainKey, fields: &RecordFields) -> LedgerResult<()> {
    if let Some(field) = fields.first_blank_field() {
        return Err(LedgerError::validation(field, "must not be empty"));
    }
    if fields.property_number.trim() != key.as_str() {
        return Err(LedgerError::validation(
            "property_number",
            format!(
                "{:?} does not belong to chain {key}",
                fields.property_number
            ),
        ));
    }
    Ok(())
}
