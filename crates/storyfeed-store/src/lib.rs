//! Document storage for storyfeed.
//!
//! The core never talks to a database directly. It is handed store handles
//! implementing [`DocumentStore`], one per record kind, and expresses every
//! read and write through that trait. This keeps the vote engine and the
//! sweeper testable against in-memory and failure-injecting fakes.
//!
//! # Backends
//!
//! - [`InMemoryStore`] -- `HashMap`-based store for tests, demos and the
//!   default server
//!
//! # Design Rules
//!
//! 1. A patch is applied to one document under the store's write lock, so
//!    a single `patch_by_id` (and `update_by_id`) is atomic per document.
//! 2. Bulk updates are atomic per call in the in-memory backend, but callers
//!    must not rely on that: other backends only promise per-document
//!    atomicity.
//! 3. Unique keys (usernames) are enforced by the store on create and
//!    update, regardless of any pre-check done by the caller.
//! 4. Transient failures are reported with [`StoreError::is_transient`] so
//!    callers can decide whether a retry is meaningful.

pub mod error;
pub mod memory;
pub mod story;
pub mod traits;
pub mod user;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use story::{StoryFilter, StoryPatch, StorySort};
pub use traits::{BulkUpdate, Document, DocumentStore, Patched, Query};
pub use user::{UserFilter, UserPatch, UserSort};
