use std::sync::Arc;

use deed_crypto::{LinkChecker, LinkViolation};
use deed_store::RecordStore;
use deed_types::{ChainKey, LedgerRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::deadline::Deadline;
use crate::error::{LedgerError, LedgerResult};

/// Outcome of verifying one chain.
///
/// An invalid chain is reported here, never as an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub chain_key: ChainKey,
    pub valid: bool,
    pub count: usize,
    /// Chain-order index of the first violating record.
    pub first_invalid_index: Option<usize>,
    pub violations: Vec<LinkViolation>,
}

impl VerificationResult {
    fn from_violations(chain_key: ChainKey, count: usize, violations: Vec<LinkViolation>) -> Self {
        Self {
            chain_key,
            valid: violations.is_empty(),
            count,
            first_invalid_index: violations.iter().map(|v| v.index).min(),
            violations,
        }
    }
}

/// Read-only integrity check over stored chains. Takes no locks.
pub struct ChainVerifier {
    store: Arc<dyn RecordStore>,
    checker: LinkChecker,
}

impl ChainVerifier {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            checker: LinkChecker::default(),
        }
    }

    /// Fetch the chain for `key` and check every link and digest.
    ///
    /// A key with no records is a valid, empty chain. Only store failures
    /// (including deadline expiry) are errors.
    pub async fn verify(&self, key: &ChainKey, deadline: Deadline) -> LedgerResult<VerificationResult> {
        let records = deadline
            .bound("chain fetch", self.store.find_by_chain_key(key))
            .await
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))??;
        Ok(self.verify_records(key.clone(), records))
    }

    /// Check records that were already fetched. They are put in chain order
    /// first; no records are filtered out.
    pub fn verify_records(&self, key: ChainKey, mut records: Vec<LedgerRecord>) -> VerificationResult {
        records.sort_by(LedgerRecord::chain_order);
        let violations = self.checker.check(&records);
        let result = VerificationResult::from_violations(key, records.len(), violations);

        if result.valid {
            debug!(chain_key = %result.chain_key, count = result.count, "chain verified");
        } else {
            warn!(
                chain_key = %result.chain_key,
                count = result.count,
                violations = result.violations.len(),
                first_invalid_index = ?result.first_invalid_index,
                "chain failed verification"
            );
        }
        result
    }
}
