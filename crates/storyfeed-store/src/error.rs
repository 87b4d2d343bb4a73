use storyfeed_types::{EntityKind, RecordId};

/// Errors from document store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A document with this identifier already exists.
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: RecordId },

    /// A unique key (e.g. a username) is already taken by another document.
    #[error("duplicate {kind} key: {key}")]
    DuplicateKey { kind: EntityKind, key: String },

    /// The backend is temporarily unavailable. Safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer in time. Safe to retry.
    #[error("store operation timed out: {0}")]
    Timeout(String),

    /// Any other backend failure. Not worth retrying.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` for failures a retry may resolve.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
