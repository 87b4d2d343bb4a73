use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::RecordId;
use crate::vote::VoteSets;

/// Returns `true` if an opaque content payload counts as missing.
///
/// `null` and strings that are empty after trimming are blank. Every other
/// JSON value, including `0`, `false`, `[]` and `{}`, is real content.
pub fn content_is_blank(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user identity record.
///
/// Stories and comments refer to users by [`RecordId`] only; a user never
/// owns the records that point at it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl User {
    /// Create a user with a fresh identifier and no optional profile fields.
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            name: name.into(),
            username: username.into(),
            password_hash: password_hash.into(),
            email: email.into(),
            age: None,
            picture: None,
        }
    }

    /// Password-free view for responses.
    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

/// A user record as shown to callers: everything except the password hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: RecordId,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            age: user.age,
            picture: user.picture.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment embedded in a story.
///
/// `user` is `None` once the author has been deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub user: Option<RecordId>,
    pub content: Value,
    #[serde(default)]
    pub edited: bool,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(user: RecordId, content: Value) -> Self {
        Self {
            user: Some(user),
            content,
            edited: false,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

/// A user-authored post with vote tallies and an ordered comment thread.
///
/// `user` is `None` once the owner has been deleted; the story itself is
/// kept. Comments are in insertion order, which is also display order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: RecordId,
    pub content: Value,
    #[serde(default)]
    pub votes: VoteSets,
    pub user: Option<RecordId>,
    #[serde(default)]
    pub edited: bool,
    pub time_created: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Story {
    /// Create a story owned by `owner` with empty tallies and no comments.
    pub fn new(owner: RecordId, content: Value) -> Self {
        Self {
            id: RecordId::generate(),
            content,
            votes: VoteSets::new(),
            user: Some(owner),
            edited: false,
            time_created: Utc::now(),
            comments: Vec::new(),
        }
    }

    pub fn is_owned_by(&self, user: &RecordId) -> bool {
        self.user.as_ref() == Some(user)
    }

    /// Returns `true` if any comment in the thread is authored by `user`.
    pub fn has_comment_by(&self, user: &RecordId) -> bool {
        self.comments.iter().any(|c| c.user.as_ref() == Some(user))
    }

    /// Replace the content and mark the story as edited.
    pub fn replace_content(&mut self, content: Value) {
        self.content = content;
        self.edited = true;
    }

    /// Append a comment at the end of the thread.
    pub fn append_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Null the owner reference if it points at `user`. Returns `true` if it
    /// did.
    pub fn tombstone_owner(&mut self, user: &RecordId) -> bool {
        if self.is_owned_by(user) {
            self.user = None;
            true
        } else {
            false
        }
    }

    /// Null the author of every comment written by `user`. Returns how many
    /// comments changed.
    pub fn tombstone_comment_authors(&mut self, user: &RecordId) -> usize {
        let mut changed = 0;
        for comment in &mut self.comments {
            if comment.user.as_ref() == Some(user) {
                comment.user = None;
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(n: u8) -> RecordId {
        RecordId::from_raw([n; 12])
    }

    #[test]
    fn blank_content_detection() {
        assert!(content_is_blank(&Value::Null));
        assert!(content_is_blank(&json!("")));
        assert!(content_is_blank(&json!("   ")));
        assert!(!content_is_blank(&json!("hi")));
        assert!(!content_is_blank(&json!(0)));
        assert!(!content_is_blank(&json!({"text": "x"})));
    }

    #[test]
    fn user_view_omits_password() {
        let user = User::new("Ada", "ada", "$argon2id$secret", "ada@example.com");
        let json = serde_json::to_value(user.view()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "ada");
    }

    #[test]
    fn new_story_has_empty_tallies() {
        let story = Story::new(id(1), json!("hello"));
        assert!(story.votes.is_empty());
        assert!(story.comments.is_empty());
        assert!(!story.edited);
        assert!(story.is_owned_by(&id(1)));
    }

    #[test]
    fn replace_content_sets_edited() {
        let mut story = Story::new(id(1), json!("v1"));
        story.replace_content(json!("v2"));
        assert_eq!(story.content, json!("v2"));
        assert!(story.edited);
    }

    #[test]
    fn comments_keep_insertion_order() {
        let mut story = Story::new(id(1), json!("post"));
        story.append_comment(Comment::new(id(2), json!("first")));
        story.append_comment(Comment::new(id(3), json!("second")));
        let texts: Vec<_> = story.comments.iter().map(|c| c.content.clone()).collect();
        assert_eq!(texts, vec![json!("first"), json!("second")]);
    }

    #[test]
    fn tombstone_owner_only_matches_owner() {
        let mut story = Story::new(id(1), json!("post"));
        assert!(!story.tombstone_owner(&id(2)));
        assert_eq!(story.user, Some(id(1)));
        assert!(story.tombstone_owner(&id(1)));
        assert_eq!(story.user, None);
        assert!(!story.tombstone_owner(&id(1)));
    }

    #[test]
    fn tombstone_comment_authors_counts_every_match() {
        let mut story = Story::new(id(1), json!("post"));
        story.append_comment(Comment::new(id(2), json!("a")));
        story.append_comment(Comment::new(id(3), json!("b")));
        story.append_comment(Comment::new(id(2), json!("c")));

        assert_eq!(story.tombstone_comment_authors(&id(2)), 2);
        assert!(!story.has_comment_by(&id(2)));
        assert_eq!(story.comments.len(), 3);
        assert_eq!(story.comments[1].user, Some(id(3)));
        assert_eq!(story.tombstone_comment_authors(&id(2)), 0);
    }

    #[test]
    fn story_serde_roundtrip() {
        let mut story = Story::new(id(1), json!({"title": "t"}));
        story.votes.apply(id(4), &crate::VoteKind::Down);
        story.append_comment(Comment::new(id(2), json!("c")));
        let text = serde_json::to_string(&story).unwrap();
        let back: Story = serde_json::from_str(&text).unwrap();
        assert_eq!(back, story);
    }

    #[test]
    fn story_json_uses_camel_case_keys() {
        let mut story = Story::new(id(1), json!("post"));
        story.append_comment(Comment::new(id(2), json!("c")));
        let value = serde_json::to_value(&story).unwrap();
        assert!(value.get("timeCreated").is_some());
        assert!(value.get("time_created").is_none());
        assert!(value["comments"][0].get("timestamp").is_some());

        let parsed: Story = serde_json::from_value(json!({
            "id": id(3).to_hex(),
            "content": "x",
            "user": null,
            "timeCreated": "2024-01-02T03:04:05Z",
        }))
        .unwrap();
        assert_eq!(parsed.user, None);
        assert_eq!(parsed.time_created.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(parsed.comments.is_empty() && parsed.votes.is_empty());
    }
}
