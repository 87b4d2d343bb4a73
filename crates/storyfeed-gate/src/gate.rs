use std::sync::Arc;

use storyfeed_store::DocumentStore;
use storyfeed_types::{EntityKind, RecordId, Story, User};
use tracing::debug;

use crate::error::GateError;

// ---------------------------------------------------------------------------
// EntityHandle
// ---------------------------------------------------------------------------

/// A record that passed the gate, as read at check time.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityHandle {
    Story(Story),
    User(User),
}

impl EntityHandle {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Story(_) => EntityKind::Story,
            Self::User(_) => EntityKind::User,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            Self::Story(story) => story.id,
            Self::User(user) => user.id,
        }
    }

    pub fn into_story(self) -> Option<Story> {
        match self {
            Self::Story(story) => Some(story),
            Self::User(_) => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Self::User(user) => Some(user),
            Self::Story(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RecordGate
// ---------------------------------------------------------------------------

/// Format and existence checks over the story and user stores.
///
/// Cheap to clone; holds only store handles.
#[derive(Clone)]
pub struct RecordGate {
    stories: Arc<dyn DocumentStore<Story>>,
    users: Arc<dyn DocumentStore<User>>,
}

impl RecordGate {
    pub fn new(stories: Arc<dyn DocumentStore<Story>>, users: Arc<dyn DocumentStore<User>>) -> Self {
        Self { stories, users }
    }

    /// Format check only. Does not touch a store.
    pub fn check_format(kind: EntityKind, raw: &str) -> Result<RecordId, GateError> {
        raw.parse::<RecordId>().map_err(|e| {
            debug!(%kind, raw, "rejected malformed id");
            GateError::InvalidIdentifier {
                kind,
                raw: raw.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Format check, then existence check against the store for `kind`.
    pub async fn validate_existing_id(
        &self,
        kind: EntityKind,
        raw: &str,
    ) -> Result<EntityHandle, GateError> {
        let id = Self::check_format(kind, raw)?;
        let found = match kind {
            EntityKind::Story => self.stories.find_by_id(&id).await?.map(EntityHandle::Story),
            EntityKind::User => self.users.find_by_id(&id).await?.map(EntityHandle::User),
        };
        found.ok_or_else(|| {
            debug!(%kind, %id, "rejected unknown id");
            GateError::NotFound { kind, id }
        })
    }

    /// [`Self::validate_existing_id`] for a story.
    pub async fn existing_story(&self, raw: &str) -> Result<Story, GateError> {
        let handle = self.validate_existing_id(EntityKind::Story, raw).await?;
        let id = handle.id();
        handle.into_story().ok_or(GateError::NotFound {
            kind: EntityKind::Story,
            id,
        })
    }

    /// [`Self::validate_existing_id`] for a user.
    pub async fn existing_user(&self, raw: &str) -> Result<User, GateError> {
        let handle = self.validate_existing_id(EntityKind::User, raw).await?;
        let id = handle.id();
        handle.into_user().ok_or(GateError::NotFound {
            kind: EntityKind::User,
            id,
        })
    }
}

impl std::fmt::Debug for RecordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordGate").finish_non_exhaustive()
    }
}
