use deed_store::StoreError;

/// Errors surfaced by ledger operations.
///
/// An invalid chain is not an error: verification reports it as a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Caller-supplied input is missing or malformed. Never retried.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The store could not be reached within the deadline and retry budget.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Outcome of one read-compute-write attempt inside the append loop.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// Another writer won the compare-and-swap; retry with a fresh tail.
    ChainConflict(StoreError),
    /// Transient store failure or timeout; retry after backoff.
    Transient(String),
    /// Store failure that another attempt cannot fix.
    Fatal(String),
}

impl AttemptError {
    pub(crate) fn is_retryable(&self) -> bool {
        !matches!(self, Self::Fatal(_))
    }

    pub(crate) fn into_ledger_error(self) -> LedgerError {
        match self {
            Self::ChainConflict(e) => {
                LedgerError::StoreUnavailable(format!("chain contention persisted: {e}"))
            }
            Self::Transient(reason) | Self::Fatal(reason) => LedgerError::StoreUnavailable(reason),
        }
    }
}

impl From<StoreError> for AttemptError {
    fn from(e: StoreError) -> Self {
        if e.is_conflict() {
            Self::ChainConflict(e)
        } else if e.is_transient() {
            Self::Transient(e.to_string())
        } else {
            Self::Fatal(e.to_string())
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}
