use std::sync::Arc;

use serde_json::Value;
use storyfeed_gate::RecordGate;
use storyfeed_store::{DocumentStore, Query, StoryFilter, StoryPatch, StorySort};
use storyfeed_types::{content_is_blank, Comment, EntityKind, RecordId, Story};
use tracing::{debug, info};

use crate::config::StoryLimits;
use crate::error::{FeedError, FeedResult};
use crate::request::{present, CommentInput, NewStory, StoryUpdate};

/// Story create, edit, delete and listing.
#[derive(Clone)]
pub struct StoryService {
    stories: Arc<dyn DocumentStore<Story>>,
    gate: RecordGate,
    limits: StoryLimits,
}

impl StoryService {
    pub fn new(stories: Arc<dyn DocumentStore<Story>>, gate: RecordGate, limits: StoryLimits) -> Self {
        Self {
            stories,
            gate,
            limits,
        }
    }

    /// Newest first, optionally restricted to one owner.
    pub async fn list_stories(&self, owner: Option<&str>, amount: Option<usize>) -> FeedResult<Vec<Story>> {
        let mut query = match owner.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let user = self.gate.existing_user(raw).await?;
                Query::filtered(StoryFilter::OwnedBy(user.id))
            }
            None => Query::all(),
        };
        query = query.sorted(StorySort::NewestFirst).limit(self.limits.resolve(amount));

        let stories = self.stories.find(&query).await?;
        if stories.is_empty() {
            return Err(FeedError::NoMatches(EntityKind::Story));
        }
        Ok(stories)
    }

    pub async fn create_story(&self, req: NewStory) -> FeedResult<Story> {
        let (Some(owner), Some(content)) = (present(&req.owner), non_blank(req.content)) else {
            return Err(FeedError::invalid_payload("story owner id and content are required"));
        };
        let owner = self.gate.existing_user(owner).await?;
        let story = self.stories.create(Story::new(owner.id, content)).await?;
        info!(story = %story.id, owner = %owner.id, "story created");
        Ok(story)
    }

    /// Replace content, append a comment, or both.
    ///
    /// Blank content is ignored. A comment must carry an author and
    /// non-blank content; otherwise nothing is written.
    pub async fn update_story(&self, req: StoryUpdate) -> FeedResult<Story> {
        let Some(raw) = present(&req.story_id) else {
            return Err(FeedError::invalid_payload("story id is required"));
        };
        let story = self.gate.existing_story(raw).await?;

        let content = non_blank(req.content);
        let comment = match req.comment {
            Some(input) => Some(self.resolve_comment(input).await?),
            None => None,
        };
        if content.is_none() && comment.is_none() {
            return Err(FeedError::invalid_payload("no content or comment provided"));
        }

        let patch = StoryPatch::Edit { content, comment };
        let updated = self
            .stories
            .update_by_id(&story.id, &patch)
            .await?
            .ok_or(FeedError::NotFound {
                kind: EntityKind::Story,
                id: story.id,
            })?;
        debug!(story = %updated.id, edited = updated.edited, comments = updated.comments.len(), "story updated");
        Ok(updated)
    }

    pub async fn delete_story(&self, raw: Option<&str>) -> FeedResult<RecordId> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Err(FeedError::invalid_payload("story id is required"));
        };
        let story = self.gate.existing_story(raw).await?;
        self.stories
            .delete_by_id(&story.id)
            .await?
            .ok_or(FeedError::NotFound {
                kind: EntityKind::Story,
                id: story.id,
            })?;
        info!(story = %story.id, "story deleted");
        Ok(story.id)
    }

    async fn resolve_comment(&self, input: CommentInput) -> FeedResult<Comment> {
        let (Some(author), Some(content)) = (present(&input.user), non_blank(input.content)) else {
            return Err(FeedError::invalid_payload("comment needs an author and content"));
        };
        let author = self.gate.existing_user(author).await?;
        Ok(Comment::new(author.id, content))
    }
}

fn non_blank(content: Option<Value>) -> Option<Value> {
    content.filter(|c| !content_is_blank(c))
}
