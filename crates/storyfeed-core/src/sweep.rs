use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use storyfeed_store::{BulkUpdate, DocumentStore, StoryFilter, StoryPatch};
use storyfeed_types::{RecordId, Story};
use tracing::{debug, warn};

use crate::config::SweepConfig;
use crate::error::{FeedError, FeedResult};

/// The two bulk passes run before a user is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepPass {
    /// Null the owner of every story the user owns.
    Stories,
    /// Null the author of every comment the user wrote.
    Comments,
}

impl SweepPass {
    fn plan(self, user: RecordId) -> (StoryFilter, StoryPatch) {
        match self {
            Self::Stories => (StoryFilter::OwnedBy(user), StoryPatch::ClearOwner(user)),
            Self::Comments => (
                StoryFilter::CommentedBy(user),
                StoryPatch::ClearCommentAuthor(user),
            ),
        }
    }
}

impl fmt::Display for SweepPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stories => write!(f, "story owner"),
            Self::Comments => write!(f, "comment author"),
        }
    }
}

/// What a successful sweep changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub stories_updated: usize,
    /// Individual comments, not the stories holding them.
    pub comments_updated: usize,
}

/// Tombstones every reference to a user ahead of the user's deletion.
#[derive(Clone)]
pub struct Sweeper {
    stories: Arc<dyn DocumentStore<Story>>,
    retry: SweepConfig,
}

impl Sweeper {
    pub fn new(stories: Arc<dyn DocumentStore<Story>>, retry: SweepConfig) -> Self {
        Self { stories, retry }
    }

    /// Run both passes. Either failing yields [`FeedError::IntegrityFailure`]
    /// and the caller must not delete the user.
    pub async fn sweep_user_references(&self, user: RecordId) -> FeedResult<SweepReport> {
        let stories = self.run_pass(user, SweepPass::Stories).await?;
        let comments = self.run_pass(user, SweepPass::Comments).await?;
        let report = SweepReport {
            stories_updated: stories.modified,
            comments_updated: comments.elements,
        };
        debug!(
            user = %user,
            stories = report.stories_updated,
            comments = report.comments_updated,
            "sweep complete"
        );
        Ok(report)
    }

    async fn run_pass(&self, user: RecordId, pass: SweepPass) -> FeedResult<BulkUpdate> {
        let (filter, patch) = pass.plan(user);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.stories.bulk_update(&filter, &patch).await {
                Ok(summary) => return Ok(summary),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        user = %user,
                        %pass,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "sweep pass failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    warn!(user = %user, %pass, attempt, error = %source, "sweep pass failed");
                    return Err(FeedError::IntegrityFailure { user, pass, source });
                }
            }
        }
    }
}
