use std::sync::Arc;

use serde::Serialize;
use storyfeed_gate::RecordGate;
use storyfeed_store::{DocumentStore, Patched, StoryPatch};
use storyfeed_types::{EntityKind, RecordId, Story, VoteKind, VoteOutcome, VoteSets};
use tracing::{info, warn};

use crate::error::{FeedError, FeedResult};

/// Tallies of one story after a vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyView {
    pub story_id: RecordId,
    pub upvotes: Vec<RecordId>,
    pub downvotes: Vec<RecordId>,
    pub score: i64,
    pub outcome: VoteOutcome,
}

impl TallyView {
    fn new(story_id: RecordId, votes: &VoteSets, outcome: VoteOutcome) -> Self {
        Self {
            story_id,
            upvotes: votes.upvotes().iter().copied().collect(),
            downvotes: votes.downvotes().iter().copied().collect(),
            score: votes.score(),
            outcome,
        }
    }
}

/// Applies up/down toggles to a story's vote sets.
#[derive(Clone)]
pub struct VoteEngine {
    stories: Arc<dyn DocumentStore<Story>>,
    gate: RecordGate,
}

impl VoteEngine {
    pub fn new(stories: Arc<dyn DocumentStore<Story>>, gate: RecordGate) -> Self {
        Self { stories, gate }
    }

    /// Toggle `voter_raw`'s vote of `kind` on `story_raw`.
    ///
    /// Both ids are checked for format before either is looked up. The
    /// toggle itself is a single [`StoryPatch::ToggleVote`], so concurrent
    /// votes on one story never overwrite each other. The outcome is read
    /// off the snapshots taken by that same patch, never off the earlier
    /// existence check.
    pub async fn apply_vote(
        &self,
        story_raw: &str,
        voter_raw: &str,
        kind: &VoteKind,
    ) -> FeedResult<TallyView> {
        let story_id = RecordGate::check_format(EntityKind::Story, story_raw)?;
        RecordGate::check_format(EntityKind::User, voter_raw)?;
        let voter = self.gate.existing_user(voter_raw).await?.id;
        let current = self.gate.existing_story(story_raw).await?;

        if let VoteKind::Unrecognized(raw) = kind {
            warn!(story = %story_id, voter = %voter, kind = %raw, "ignoring unrecognized vote kind");
            return Ok(TallyView::new(story_id, &current.votes, VoteOutcome::Unchanged));
        }

        let patch = StoryPatch::ToggleVote {
            voter,
            kind: kind.clone(),
        };
        let Patched { before, after } = self
            .stories
            .patch_by_id(&story_id, &patch)
            .await?
            .ok_or(FeedError::NotFound {
                kind: EntityKind::Story,
                id: story_id,
            })?;

        let outcome = outcome_of(&before.votes, &after.votes, &voter, kind);
        info!(
            story = %story_id,
            voter = %voter,
            kind = %kind,
            ?outcome,
            score = after.votes.score(),
            "vote applied"
        );
        Ok(TallyView::new(story_id, &after.votes, outcome))
    }
}

/// What happened to `voter`'s own membership between two snapshots.
fn outcome_of(before: &VoteSets, after: &VoteSets, voter: &RecordId, kind: &VoteKind) -> VoteOutcome {
    let (now_in_target, was_in_opposite) = match kind {
        VoteKind::Up => (after.has_upvoted(voter), before.has_downvoted(voter)),
        VoteKind::Down => (after.has_downvoted(voter), before.has_upvoted(voter)),
        VoteKind::Unrecognized(_) => return VoteOutcome::Unchanged,
    };
    match (now_in_target, was_in_opposite) {
        (true, true) => VoteOutcome::Switched,
        (true, false) => VoteOutcome::Added,
        (false, _) => VoteOutcome::Removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use storyfeed_store::{BulkUpdate, InMemoryStore, Query, StoreResult, StoryFilter};
    use storyfeed_types::User;

    struct Fixture {
        engine: VoteEngine,
        stories: Arc<InMemoryStore<Story>>,
        users: Arc<InMemoryStore<User>>,
    }

    fn fixture() -> Fixture {
        let stories = Arc::new(InMemoryStore::new());
        let users = Arc::new(InMemoryStore::new());
        let gate = RecordGate::new(stories.clone(), users.clone());
        Fixture {
            engine: VoteEngine::new(stories.clone(), gate),
            stories,
            users,
        }
    }

    async fn user(f: &Fixture, username: &str) -> RecordId {
        f.users
            .create(User::new(username, username, "h", "x@example.com"))
            .await
            .unwrap()
            .id
    }

    async fn story(f: &Fixture, owner: RecordId) -> RecordId {
        f.stories
            .create(Story::new(owner, json!("story")))
            .await
            .unwrap()
            .id
    }

    // -----------------------------------------------------------------------
    // Toggle semantics
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn up_vote_sequence_end_to_end() {
        let f = fixture();
        let u1 = user(&f, "u1").await;
        let s = story(&f, u1).await;
        let (s_raw, u_raw) = (s.to_hex(), u1.to_hex());

        let t = f.engine.apply_vote(&s_raw, &u_raw, &VoteKind::Up).await.unwrap();
        assert_eq!((t.upvotes.clone(), t.downvotes.clone()), (vec![u1], vec![]));
        assert_eq!(t.outcome, VoteOutcome::Added);
        assert_eq!(t.score, 1);

        let t = f.engine.apply_vote(&s_raw, &u_raw, &VoteKind::Up).await.unwrap();
        assert!(t.upvotes.is_empty() && t.downvotes.is_empty());
        assert_eq!(t.outcome, VoteOutcome::Removed);

        let t = f.engine.apply_vote(&s_raw, &u_raw, &VoteKind::Down).await.unwrap();
        assert_eq!((t.upvotes.clone(), t.downvotes.clone()), (vec![], vec![u1]));
        assert_eq!(t.score, -1);

        let t = f.engine.apply_vote(&s_raw, &u_raw, &VoteKind::Up).await.unwrap();
        assert_eq!((t.upvotes.clone(), t.downvotes.clone()), (vec![u1], vec![]));
        assert_eq!(t.outcome, VoteOutcome::Switched);
        assert_eq!(t.story_id, s);
    }

    #[tokio::test]
    async fn tallies_are_persisted() {
        let f = fixture();
        let u1 = user(&f, "u1").await;
        let s = story(&f, u1).await;
        f.engine
            .apply_vote(&s.to_hex(), &u1.to_hex(), &VoteKind::Down)
            .await
            .unwrap();

        let stored = f.stories.find_by_id(&s).await.unwrap().unwrap();
        assert!(stored.votes.has_downvoted(&u1));
        assert!(!stored.votes.has_upvoted(&u1));
    }

    #[tokio::test]
    async fn unrecognized_kind_is_a_no_op() {
        let f = fixture();
        let u1 = user(&f, "u1").await;
        let s = story(&f, u1).await;
        f.engine
            .apply_vote(&s.to_hex(), &u1.to_hex(), &VoteKind::Up)
            .await
            .unwrap();

        let kind = VoteKind::parse("sideways");
        let t = f
            .engine
            .apply_vote(&s.to_hex(), &u1.to_hex(), &kind)
            .await
            .unwrap();
        assert_eq!(t.outcome, VoteOutcome::Unchanged);
        assert_eq!(t.upvotes, vec![u1]);
        assert!(t.downvotes.is_empty());
    }

    // -----------------------------------------------------------------------
    // Gate rejections
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn malformed_story_id_is_rejected_without_change() {
        let f = fixture();
        let u1 = user(&f, "u1").await;
        let s = story(&f, u1).await;

        let err = f
            .engine
            .apply_vote("zzz", &u1.to_hex(), &VoteKind::Up)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::InvalidIdentifier {
                kind: EntityKind::Story,
                ..
            }
        ));
        let stored = f.stories.find_by_id(&s).await.unwrap().unwrap();
        assert!(stored.votes.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let f = fixture();
        let u1 = user(&f, "u1").await;
        let s = story(&f, u1).await;

        let err = f
            .engine
            .apply_vote(&RecordId::generate().to_hex(), &u1.to_hex(), &VoteKind::Up)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::NotFound {
                kind: EntityKind::Story,
                ..
            }
        ));

        let err = f
            .engine
            .apply_vote(&s.to_hex(), &RecordId::generate().to_hex(), &VoteKind::Up)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::NotFound {
                kind: EntityKind::User,
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_are_all_kept() {
        let f = fixture();
        let owner = user(&f, "owner").await;
        let s = story(&f, owner).await;
        let mut voters = Vec::new();
        for i in 0..20 {
            voters.push(user(&f, &format!("voter{i}")).await);
        }

        let engine = Arc::new(f.engine.clone());
        let mut handles = Vec::new();
        for (i, voter) in voters.iter().enumerate() {
            let engine = engine.clone();
            let (s_raw, v_raw) = (s.to_hex(), voter.to_hex());
            let kind = if i % 2 == 0 { VoteKind::Up } else { VoteKind::Down };
            handles.push(tokio::spawn(async move {
                engine.apply_vote(&s_raw, &v_raw, &kind).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = f.stories.find_by_id(&s).await.unwrap().unwrap();
        assert_eq!(stored.votes.upvotes().len(), 10);
        assert_eq!(stored.votes.downvotes().len(), 10);
        assert_eq!(stored.votes.score(), 0);
    }

    /// Story store that lands one queued write of its own just before the
    /// next patch, after any read the caller made.
    struct InterleavingStore {
        inner: InMemoryStore<Story>,
        queued: Mutex<Option<(RecordId, StoryPatch)>>,
    }

    #[async_trait]
    impl DocumentStore<Story> for InterleavingStore {
        async fn find_by_id(&self, id: &RecordId) -> StoreResult<Option<Story>> {
            self.inner.find_by_id(id).await
        }

        async fn find(&self, query: &Query<Story>) -> StoreResult<Vec<Story>> {
            self.inner.find(query).await
        }

        async fn create(&self, document: Story) -> StoreResult<Story> {
            self.inner.create(document).await
        }

        async fn patch_by_id(&self, id: &RecordId, patch: &StoryPatch) -> StoreResult<Option<Patched<Story>>> {
            let queued = self.queued.lock().unwrap().take();
            if let Some((target, write)) = queued {
                self.inner.patch_by_id(&target, &write).await?;
            }
            self.inner.patch_by_id(id, patch).await
        }

        async fn bulk_update(&self, filter: &StoryFilter, patch: &StoryPatch) -> StoreResult<BulkUpdate> {
            self.inner.bulk_update(filter, patch).await
        }

        async fn delete_by_id(&self, id: &RecordId) -> StoreResult<Option<Story>> {
            self.inner.delete_by_id(id).await
        }
    }

    #[tokio::test]
    async fn outcome_reflects_write_landing_after_existence_check() {
        let users = Arc::new(InMemoryStore::new());
        let voter = users
            .create(User::new("u1", "u1", "h", "x@example.com"))
            .await
            .unwrap()
            .id;
        let stories = Arc::new(InterleavingStore {
            inner: InMemoryStore::new(),
            queued: Mutex::new(None),
        });
        let s = stories.create(Story::new(voter, json!("story"))).await.unwrap().id;
        let engine = VoteEngine::new(stories.clone(), RecordGate::new(stories.clone(), users));

        // The engine sees no vote when it checks the story, but the same
        // voter's upvote is stored before its downvote is applied.
        *stories.queued.lock().unwrap() = Some((
            s,
            StoryPatch::ToggleVote {
                voter,
                kind: VoteKind::Up,
            },
        ));
        let t = engine
            .apply_vote(&s.to_hex(), &voter.to_hex(), &VoteKind::Down)
            .await
            .unwrap();

        assert_eq!(t.outcome, VoteOutcome::Switched);
        assert!(t.upvotes.is_empty());
        assert_eq!(t.downvotes, vec![voter]);
        let stored = stories.find_by_id(&s).await.unwrap().unwrap();
        assert!(stored.votes.has_downvoted(&voter));
        assert!(!stored.votes.has_upvoted(&voter));
    }

    #[test]
    fn outcome_classification() {
        let voter = RecordId::from_raw([9; 12]);
        let empty = VoteSets::new();
        let mut down = VoteSets::new();
        down.apply(voter, &VoteKind::Down);
        let mut up = VoteSets::new();
        up.apply(voter, &VoteKind::Up);

        assert_eq!(outcome_of(&empty, &up, &voter, &VoteKind::Up), VoteOutcome::Added);
        assert_eq!(outcome_of(&up, &empty, &voter, &VoteKind::Up), VoteOutcome::Removed);
        assert_eq!(outcome_of(&down, &up, &voter, &VoteKind::Up), VoteOutcome::Switched);
    }
}
