use std::sync::Arc;

use deed_store::RecordStore;
use deed_types::{ChainKey, LedgerRecord, RecordFields};

use crate::builder::ChainBuilder;
use crate::config::LedgerConfig;
use crate::deadline::Deadline;
use crate::error::{LedgerError, LedgerResult};
use crate::history::History;
use crate::locks::ChainLocks;
use crate::verifier::{ChainVerifier, VerificationResult};

/// High-level ledger API over one record store.
///
/// Cheap to share behind an `Arc`; every append goes through one lock table.
pub struct Ledger {
    store: Arc<dyn RecordStore>,
    builder: ChainBuilder,
    verifier: ChainVerifier,
    history: History,
    config: LedgerConfig,
}

impl Ledger {
    pub fn new(store: Arc<dyn RecordStore>, config: LedgerConfig) -> Self {
        let locks = Arc::new(ChainLocks::new());
        Self {
            builder: ChainBuilder::with_locks(Arc::clone(&store), locks, config.retry.clone()),
            verifier: ChainVerifier::new(Arc::clone(&store)),
            history: History::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// A deadline one default timeout from now.
    pub fn default_deadline(&self) -> Deadline {
        Deadline::after(self.config.default_timeout())
    }

    // ---- Writes ----

    /// Append to the chain named by `fields.property_number`.
    pub async fn append(&self, fields: RecordFields, deadline: Deadline) -> LedgerResult<LedgerRecord> {
        let key = ChainKey::new(&fields.property_number)
            .map_err(|_| LedgerError::validation("property_number", "must not be empty"))?;
        self.builder.append(&key, fields, deadline).await
    }

    // ---- Reads ----

    pub async fn verify(&self, key: &ChainKey, deadline: Deadline) -> LedgerResult<VerificationResult> {
        self.verifier.verify(key, deadline).await
    }

    pub async fn property_history(&self, key: &ChainKey, deadline: Deadline) -> LedgerResult<Vec<LedgerRecord>> {
        self.history.by_property(key, deadline).await
    }

    pub async fn survey_history(&self, survey_number: &str, deadline: Deadline) -> LedgerResult<Vec<LedgerRecord>> {
        self.history.by_survey(survey_number, deadline).await
    }

    /// Total records across all chains.
    pub async fn record_count(&self, deadline: Deadline) -> LedgerResult<usize> {
        deadline
            .bound("record count", self.store.len())
            .await
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?
            .map_err(LedgerError::from)
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("config", &self.config).finish()
    }
}
