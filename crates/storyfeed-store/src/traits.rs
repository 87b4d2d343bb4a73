use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use storyfeed_types::{EntityKind, RecordId};

use crate::error::StoreResult;

/// A record kind the store knows how to hold.
///
/// Each kind brings its own typed filter, patch and sort vocabulary instead
/// of a stringly-typed query language. The store never looks inside a
/// document except through these hooks.
pub trait Document: Clone + Send + Sync + 'static {
    /// Predicate used by `find` and `bulk_update`.
    type Filter: Clone + fmt::Debug + Send + Sync;
    /// In-place mutation applied by `update_by_id` and `bulk_update`.
    type Patch: fmt::Debug + Send + Sync;
    /// Ordering used by `find`.
    type Sort: Clone + fmt::Debug + Send + Sync;

    /// The record kind, for error reporting.
    const KIND: EntityKind;

    fn id(&self) -> RecordId;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Apply a patch in place and return how many elements it changed.
    ///
    /// `0` means the document is unchanged. For patches that touch embedded
    /// sequences (comments) the count is per element, so a single document
    /// can report more than one change.
    fn apply(&mut self, patch: &Self::Patch) -> usize;

    fn compare(a: &Self, b: &Self, sort: &Self::Sort) -> Ordering;

    /// Key that must be unique across all documents of this kind.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// A `find` request: optional filter, optional sort, optional limit.
pub struct Query<D: Document> {
    pub filter: Option<D::Filter>,
    pub sort: Option<D::Sort>,
    pub limit: Option<usize>,
}

impl<D: Document> Query<D> {
    /// Match every document.
    pub fn all() -> Self {
        Self {
            filter: None,
            sort: None,
            limit: None,
        }
    }

    /// Match documents satisfying `filter`.
    pub fn filtered(filter: D::Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::all()
        }
    }

    pub fn sorted(mut self, sort: D::Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl<D: Document> fmt::Debug for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("kind", &D::KIND)
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Counts reported by a bulk update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BulkUpdate {
    /// Documents that matched the filter.
    pub matched: usize,
    /// Documents the patch actually changed.
    pub modified: usize,
    /// Elements changed across all documents (see [`Document::apply`]).
    pub elements: usize,
}

/// Both sides of one atomic patch.
#[derive(Clone, Debug, PartialEq)]
pub struct Patched<D> {
    /// The document as stored immediately before the patch.
    pub before: D,
    /// The document as stored after the patch.
    pub after: D,
}

/// Async document store for one record kind.
///
/// Implementations must be shareable across concurrent requests
/// (`Send + Sync`). Every method suspends only while waiting on backend
/// I/O. `patch_by_id` applies its patch atomically for that one document;
/// nothing spans documents.
#[async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    /// Read a document by id. `Ok(None)` if it does not exist.
    async fn find_by_id(&self, id: &RecordId) -> StoreResult<Option<D>>;

    /// Read every document matching the query, sorted and limited.
    async fn find(&self, query: &Query<D>) -> StoreResult<Vec<D>>;

    /// Insert a new document and return it.
    async fn create(&self, document: D) -> StoreResult<D>;

    /// Patch one document atomically and return the snapshots on either
    /// side of the patch, or `Ok(None)` if no document has that id.
    ///
    /// `before` is read under the same atomicity as the write, so it
    /// reflects any patch that landed earlier, even one applied after the
    /// caller's own last read.
    async fn patch_by_id(&self, id: &RecordId, patch: &D::Patch) -> StoreResult<Option<Patched<D>>>;

    /// Patch every document matching `filter`.
    async fn bulk_update(&self, filter: &D::Filter, patch: &D::Patch) -> StoreResult<BulkUpdate>;

    /// Remove a document. Returns it if it existed.
    async fn delete_by_id(&self, id: &RecordId) -> StoreResult<Option<D>>;

    /// Patch one document. Returns the updated document, or `Ok(None)` if
    /// no document has that id.
    async fn update_by_id(&self, id: &RecordId, patch: &D::Patch) -> StoreResult<Option<D>> {
        Ok(self.patch_by_id(id, patch).await?.map(|patched| patched.after))
    }

    /// First document matching `filter`, if any.
    async fn find_one(&self, filter: &D::Filter) -> StoreResult<Option<D>> {
        let query = Query::filtered(filter.clone()).limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }

    /// Check whether a document with this id exists.
    async fn exists(&self, id: &RecordId) -> StoreResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}
