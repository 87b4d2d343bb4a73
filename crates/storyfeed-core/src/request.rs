//! Inbound payloads.
//!
//! Every field is optional at the serde level so that a missing field
//! surfaces as [`FeedError::InvalidPayload`] from the service rather than as
//! a deserialization failure.
//!
//! [`FeedError::InvalidPayload`]: crate::FeedError::InvalidPayload

use serde::Deserialize;
use serde_json::Value;

/// Create a story.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    /// Owning user id. Accepted as `id` on the wire.
    #[serde(alias = "id")]
    pub owner: Option<String>,
    pub content: Option<Value>,
}

/// Edit a story: replace its content, append a comment, or both.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryUpdate {
    pub story_id: Option<String>,
    pub content: Option<Value>,
    pub comment: Option<CommentInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommentInput {
    pub user: Option<String>,
    pub content: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub user_id: Option<String>,
}

/// Body of the story and user delete requests.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeleteRequest {
    pub id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StoryListQuery {
    pub user: Option<String>,
    pub amount: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub age: Option<u32>,
    pub picture: Option<String>,
}

/// Full profile replacement. `password` is only re-hashed when present.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub id: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub age: Option<u32>,
    pub picture: Option<String>,
}

/// Trimmed, non-empty text, or `None`.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
