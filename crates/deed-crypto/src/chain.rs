use std::collections::HashMap;
use std::fmt;

use deed_types::{LedgerRecord, PrevHash, RecordId};
use serde::{Deserialize, Serialize};

use crate::hasher::RecordHasher;

/// Hash chain link checker.
///
/// Checks a slice of records that is already in chain order:
/// 1. The first record's `prev_hash` is the genesis sentinel
/// 2. Each subsequent record's `prev_hash` equals the preceding record's `hash`
/// 3. Each record's `hash` recomputes from its own fields and `prev_hash`
/// 4. No two records share a `prev_hash` (no forks)
///
/// The scan never stops early: every violation is reported.
pub struct LinkChecker {
    hasher: RecordHasher,
}

impl LinkChecker {
    pub const fn new(hasher: RecordHasher) -> Self {
        Self { hasher }
    }

    /// Check `records`, returning every violation found, in index order.
    pub fn check(&self, records: &[LedgerRecord]) -> Vec<LinkViolation> {
        let mut violations = Vec::new();
        let mut seen_prev: HashMap<PrevHash, usize> = HashMap::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            if index == 0 {
                if !record.prev_hash.is_genesis() {
                    violations.push(LinkViolation::new(index, record, ViolationKind::GenesisLink));
                }
            } else if record.prev_hash != PrevHash::Digest(records[index - 1].hash) {
                violations.push(LinkViolation::new(index, record, ViolationKind::BrokenLink));
            }

            if !self.hasher.verify(record) {
                violations.push(LinkViolation::new(index, record, ViolationKind::HashMismatch));
            }

            if let Some(first) = seen_prev.insert(record.prev_hash, index) {
                violations.push(LinkViolation::new(
                    index,
                    record,
                    ViolationKind::Fork { first_index: first },
                ));
            }
        }

        violations
    }

    /// `true` if `records` has no violations.
    pub fn is_intact(&self, records: &[LedgerRecord]) -> bool {
        self.check(records).is_empty()
    }
}

impl Default for LinkChecker {
    fn default() -> Self {
        Self::new(RecordHasher::RECORD)
    }
}

/// A single integrity violation found by [`LinkChecker`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkViolation {
    /// Position of the offending record in chain order.
    pub index: usize,
    pub record_id: RecordId,
    pub kind: ViolationKind,
}

impl LinkViolation {
    fn new(index: usize, record: &LedgerRecord, kind: ViolationKind) -> Self {
        Self {
            index,
            record_id: record.id,
            kind,
        }
    }
}

impl fmt::Display for LinkViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({}): {}", self.index, self.record_id, self.kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationKind {
    /// First record does not start from the genesis sentinel.
    GenesisLink,
    /// `prev_hash` does not match the preceding record's `hash`.
    BrokenLink,
    /// Stored `hash` differs from the recomputed digest.
    HashMismatch,
    /// `prev_hash` already used by the record at `first_index`.
    Fork { first_index: usize },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenesisLink => write!(f, "first record does not link to genesis"),
            Self::BrokenLink => write!(f, "prev_hash does not match preceding record"),
            Self::HashMismatch => write!(f, "computed hash differs from stored"),
            Self::Fork { first_index } => {
                write!(f, "prev_hash already used by record #{first_index}")
            }
        }
    }
}
