use std::sync::Arc;

use deed_store::RecordStore;
use deed_types::{ChainKey, LedgerRecord};

use crate::deadline::Deadline;
use crate::error::{LedgerError, LedgerResult};

/// Unverified, chain-ordered record listings.
pub struct History {
    store: Arc<dyn RecordStore>,
}

impl History {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Every record of one property's chain.
    pub async fn by_property(&self, key: &ChainKey, deadline: Deadline) -> LedgerResult<Vec<LedgerRecord>> {
        let records = deadline
            .bound("property history", self.store.find_by_chain_key(key))
            .await
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))??;
        Ok(sorted(records))
    }

    /// Every record carrying `survey_number`, across property chains.
    ///
    /// This is a grouping view only. It is not a chain and is never verified.
    pub async fn by_survey(&self, survey_number: &str, deadline: Deadline) -> LedgerResult<Vec<LedgerRecord>> {
        if survey_number.trim().is_empty() {
            return Err(LedgerError::validation("survey_number", "must not be empty"));
        }
        let records = deadline
            .bound("survey history", self.store.find_by_survey(survey_number))
            .await
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))??;
        Ok(sorted(records))
    }
}

fn sorted(mut records: Vec<LedgerRecord>) -> Vec<LedgerRecord> {
    records.sort_by(LedgerRecord::chain_order);
    records
}
