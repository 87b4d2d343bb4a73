//! Foundation types for storyfeed.
//!
//! Every other storyfeed crate depends on `storyfeed-types`. Nothing in here
//! touches a store; these are plain records plus the one piece of pure state
//! logic the rest of the system leans on, the vote set toggle.
//!
//! # Key Types
//!
//! - [`RecordId`] -- 12-byte document identifier, rendered as 24 hex characters
//! - [`User`] / [`UserView`] -- identity record and its password-free view
//! - [`Story`] / [`Comment`] -- posts with embedded, ordered comments
//! - [`VoteSets`] -- mutually exclusive upvoter and downvoter sets
//! - [`VoteKind`] -- parsed vote direction, including the unrecognized case

pub mod error;
pub mod id;
pub mod record;
pub mod vote;

pub use error::TypeError;
pub use id::{EntityKind, RecordId};
pub use record::{content_is_blank, Comment, Story, User, UserView};
pub use vote::{VoteKind, VoteOutcome, VoteSets};
