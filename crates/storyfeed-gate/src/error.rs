use storyfeed_store::StoreError;
use storyfeed_types::{EntityKind, RecordId};

/// Reasons the gate refuses an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The identifier is not syntactically valid.
    #[error("invalid {kind} id {raw:?}: {reason}")]
    InvalidIdentifier {
        kind: EntityKind,
        raw: String,
        reason: String,
    },

    /// The identifier is well-formed but no such record exists.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: RecordId },

    /// The existence lookup itself failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GateError {
    /// Returns `true` for the two client-input failures (as opposed to a
    /// store failure).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}
