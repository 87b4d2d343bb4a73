use std::sync::Arc;

use storyfeed_gate::RecordGate;
use storyfeed_store::{DocumentStore, InMemoryStore};
use storyfeed_types::{Story, User};

use crate::config::FeedConfig;
use crate::error::FeedResult;
use crate::password::{Argon2PasswordHasher, PasswordHasher};
use crate::stories::StoryService;
use crate::sweep::Sweeper;
use crate::users::UserService;
use crate::vote::VoteEngine;

/// Every storyfeed operation, wired to one pair of stores.
///
/// Cloning is cheap and shares the underlying stores.
#[derive(Clone)]
pub struct Feed {
    stories: StoryService,
    users: UserService,
    votes: VoteEngine,
}

impl Feed {
    pub fn new(
        stories: Arc<dyn DocumentStore<Story>>,
        users: Arc<dyn DocumentStore<User>>,
        hasher: Arc<dyn PasswordHasher>,
        config: &FeedConfig,
    ) -> Self {
        let gate = RecordGate::new(Arc::clone(&stories), Arc::clone(&users));
        let sweeper = Sweeper::new(Arc::clone(&stories), config.sweep);
        Self {
            stories: StoryService::new(Arc::clone(&stories), gate.clone(), config.stories),
            users: UserService::new(users, gate.clone(), sweeper, hasher),
            votes: VoteEngine::new(stories, gate),
        }
    }

    /// In-memory stores and an Argon2id hasher built from `config`.
    pub fn in_memory(config: &FeedConfig) -> FeedResult<Self> {
        let hasher = Argon2PasswordHasher::new(&config.password)?;
        Ok(Self::new(
            Arc::new(InMemoryStore::<Story>::new()),
            Arc::new(InMemoryStore::<User>::new()),
            Arc::new(hasher),
            config,
        ))
    }

    pub fn stories(&self) -> &StoryService {
        &self.stories
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn votes(&self) -> &VoteEngine {
        &self.votes
    }
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed").finish_non_exhaustive()
    }
}
