//! HTTP server for storyfeed.
//!
//! Exposes stories, votes and users as JSON over REST. Failures are
//! rendered as `{"error": {"code", "message"}}` with a status derived from
//! the error kind.

pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use error::{status_for, ApiError, ApiResult, ServerError, ServerResult};
pub use router::build_router;
pub use server::FeedServer;
