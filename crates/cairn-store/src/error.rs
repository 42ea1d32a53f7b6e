use cairn_ref::Ref;

/// Errors from value store and dataset operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A commit named a value that was never written.
    #[error("value not found: {0}")]
    ValueNotFound(Ref),

    /// The dataset head changed since the caller last read it.
    #[error("dataset {dataset:?} head moved: expected {expected:?}, found {actual:?}")]
    HeadMoved {
        dataset: String,
        expected: Option<Ref>,
        actual: Option<Ref>,
    },

    /// The dataset name is empty or contains characters outside `[A-Za-z0-9_/-]`.
    #[error("invalid dataset id {id:?}: {reason}")]
    InvalidDatasetId { id: String, reason: String },

    /// A thread panicked while holding a store lock.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
