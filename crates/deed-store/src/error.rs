use deed_types::{ChainKey, PrevHash, RecordId};

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this id already exists.
    #[error("duplicate record id: {0}")]
    DuplicateId(RecordId),

    /// The chain tail changed between read and conditional write.
    #[error("tail of chain {chain_key} moved: expected {expected}, found {actual}")]
    TailMoved {
        chain_key: ChainKey,
        expected: PrevHash,
        actual: PrevHash,
    },

    /// The record cannot be placed in any chain.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The backend cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The journal contains a complete entry that fails its checksum or
    /// cannot be decoded.
    #[error("corrupt journal entry at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },
}

impl StoreError {
    /// Signals of a lost compare-and-swap race. Retrying the whole
    /// read-compute-write cycle with a fresh tail resolves them.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateId(_) | Self::TailMoved { .. })
    }

    /// Failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
