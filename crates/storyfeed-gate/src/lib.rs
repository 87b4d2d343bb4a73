//! Query/validation gate for storyfeed.
//!
//! Every mutating operation resolves the identifiers it was handed through
//! the gate before touching a store. The gate runs two checks, in order:
//!
//! 1. **format** -- the raw identifier parses as a [`RecordId`]
//!    (otherwise [`GateError::InvalidIdentifier`]);
//! 2. **existence** -- a record of the expected kind has that id
//!    (otherwise [`GateError::NotFound`]).
//!
//! The gate is the single chokepoint that keeps mutations from targeting a
//! malformed or nonexistent record.
//!
//! [`RecordId`]: storyfeed_types::RecordId

pub mod error;
pub mod gate;

pub use error::GateError;
pub use gate::{EntityHandle, RecordGate};
