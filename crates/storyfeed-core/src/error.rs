use storyfeed_gate::GateError;
use storyfeed_store::StoreError;
use storyfeed_types::{EntityKind, RecordId};

use crate::sweep::SweepPass;

/// Errors surfaced by storyfeed operations.
///
/// Every variant aborts only the request that produced it. None of them
/// calls for process-level recovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Malformed identifier.
    #[error("invalid {kind} id {raw:?}: {reason}")]
    InvalidIdentifier {
        kind: EntityKind,
        raw: String,
        reason: String,
    },

    /// Well-formed identifier, no matching record.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: RecordId },

    /// A listing query matched nothing.
    #[error("no {0} records found")]
    NoMatches(EntityKind),

    /// Username already taken.
    #[error("duplicate username: {0}")]
    DuplicateKey(String),

    /// Missing or malformed required fields.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A sweep pass failed, so the user deletion was not carried out.
    #[error("integrity failure: {pass} sweep for user {user} failed: {source}")]
    IntegrityFailure {
        user: RecordId,
        pass: SweepPass,
        source: StoreError,
    },

    /// Store failure outside the sweep.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Anything else (password hashing, task join).
    #[error("internal error: {0}")]
    Internal(String),
}

impl FeedError {
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::NotFound { .. } => "not_found",
            Self::NoMatches(_) => "no_matches",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::IntegrityFailure { .. } => "integrity_failure",
            Self::Store(_) => "store",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<GateError> for FeedError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::InvalidIdentifier { kind, raw, reason } => {
                Self::InvalidIdentifier { kind, raw, reason }
            }
            GateError::NotFound { kind, id } => Self::NotFound { kind, id },
            GateError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for FeedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { key, .. } => Self::DuplicateKey(key),
            other => Self::Store(other),
        }
    }
}

/// Result alias for storyfeed operations.
pub type FeedResult<T> = Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_errors_keep_their_kind() {
        let err: FeedError = GateError::InvalidIdentifier {
            kind: EntityKind::Story,
            raw: "x".into(),
            reason: "short".into(),
        }
        .into();
        assert_eq!(err.code(), "invalid_identifier");

        let id = RecordId::from_raw([1; 12]);
        let err: FeedError = GateError::NotFound {
            kind: EntityKind::User,
            id,
        }
        .into();
        assert_eq!(
            err,
            FeedError::NotFound {
                kind: EntityKind::User,
                id
            }
        );
    }

    #[test]
    fn store_duplicate_key_maps_to_duplicate_key() {
        let err: FeedError = StoreError::DuplicateKey {
            kind: EntityKind::User,
            key: "ada".into(),
        }
        .into();
        assert_eq!(err, FeedError::DuplicateKey("ada".into()));
    }

    #[test]
    fn other_store_errors_stay_store_errors() {
        let err: FeedError = GateError::Store(StoreError::Backend("boom".into())).into();
        assert_eq!(err.code(), "store");
    }
}
