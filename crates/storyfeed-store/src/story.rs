//! Story filters, patches and sort orders.

use std::cmp::Ordering;

use serde_json::Value;
use storyfeed_types::{Comment, EntityKind, RecordId, Story, VoteKind};

use crate::traits::Document;

/// Which stories a query or bulk update targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoryFilter {
    /// Stories whose owner reference is this user.
    OwnedBy(RecordId),
    /// Stories with at least one comment authored by this user.
    CommentedBy(RecordId),
}

/// In-place story mutations.
///
/// Each variant is applied under the store's per-document atomicity, so
/// a vote is a single set-membership toggle against whatever the stored
/// tallies are at that moment, never a blind overwrite of both sets.
#[derive(Clone, Debug, PartialEq)]
pub enum StoryPatch {
    /// Toggle one voter's vote.
    ToggleVote { voter: RecordId, kind: VoteKind },
    /// Replace content and/or append a comment.
    Edit {
        content: Option<Value>,
        comment: Option<Comment>,
    },
    /// Null the owner reference if it points at this user.
    ClearOwner(RecordId),
    /// Null the author of every comment written by this user.
    ClearCommentAuthor(RecordId),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorySort {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl Document for Story {
    type Filter = StoryFilter;
    type Patch = StoryPatch;
    type Sort = StorySort;

    const KIND: EntityKind = EntityKind::Story;

    fn id(&self) -> RecordId {
        self.id
    }

    fn matches(&self, filter: &StoryFilter) -> bool {
        match filter {
            StoryFilter::OwnedBy(user) => self.is_owned_by(user),
            StoryFilter::CommentedBy(user) => self.has_comment_by(user),
        }
    }

    fn apply(&mut self, patch: &StoryPatch) -> usize {
        match patch {
            StoryPatch::ToggleVote { voter, kind } => {
                let before = self.votes.clone();
                self.votes.apply(*voter, kind);
                usize::from(self.votes != before)
            }
            StoryPatch::Edit { content, comment } => {
                let mut changed = 0;
                if let Some(content) = content {
                    self.replace_content(content.clone());
                    changed += 1;
                }
                if let Some(comment) = comment {
                    self.append_comment(comment.clone());
                    changed += 1;
                }
                changed
            }
            StoryPatch::ClearOwner(user) => usize::from(self.tombstone_owner(user)),
            StoryPatch::ClearCommentAuthor(user) => self.tombstone_comment_authors(user),
        }
    }

    fn compare(a: &Self, b: &Self, sort: &StorySort) -> Ordering {
        let by_time = a
            .time_created
            .cmp(&b.time_created)
            .then_with(|| a.id.cmp(&b.id));
        match sort {
            StorySort::NewestFirst => by_time.reverse(),
            StorySort::OldestFirst => by_time,
        }
    }
}
