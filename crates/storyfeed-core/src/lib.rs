//! Core logic for storyfeed.
//!
//! This crate holds the operations the HTTP layer exposes, built on the
//! gate and the document store traits:
//!
//! - [`VoteEngine`] -- toggles a voter in a story's up/down sets
//! - [`Sweeper`] -- nulls every story owner and comment author reference to
//!   a user before that user is deleted
//! - [`StoryService`] / [`UserService`] -- create, edit, delete and listing
//! - [`Feed`] -- the above wired to one pair of stores
//!
//! Stores are passed in as `Arc<dyn DocumentStore<_>>` handles, so the same
//! code runs against [`InMemoryStore`] or any other backend.
//!
//! [`InMemoryStore`]: storyfeed_store::InMemoryStore

pub mod config;
pub mod error;
pub mod password;
pub mod request;
pub mod service;
pub mod stories;
pub mod sweep;
pub mod users;
pub mod vote;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, FeedConfig, PasswordConfig, ServerSection, StoryLimits, SweepConfig};
pub use error::{FeedError, FeedResult};
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use request::{
    CommentInput, DeleteRequest, NewStory, NewUser, StoryListQuery, StoryUpdate, UserUpdate,
    VoteRequest,
};
pub use service::Feed;
pub use stories::StoryService;
pub use sweep::{SweepPass, SweepReport, Sweeper};
pub use users::{DeletedUser, UserService};
pub use vote::{TallyView, VoteEngine};
