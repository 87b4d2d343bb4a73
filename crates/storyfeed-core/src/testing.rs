//! Test doubles shared across modules.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use storyfeed_store::{
    BulkUpdate, DocumentStore, InMemoryStore, Patched, Query, StoreError, StoreResult,
    StoryFilter, StoryPatch,
};
use storyfeed_types::{RecordId, Story};

use crate::sweep::SweepPass;

/// Story store that fails the bulk update of one sweep pass a fixed number
/// of times before delegating to an in-memory store.
pub(crate) struct FlakyStore {
    inner: InMemoryStore<Story>,
    fail_on: SweepPass,
    error: StoreError,
    failures_left: AtomicU32,
    /// Bulk updates attempted for the failing pass.
    pub(crate) calls: AtomicU32,
}

impl FlakyStore {
    pub(crate) fn new(fail_on: SweepPass, error: StoreError, failures: u32) -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_on,
            error,
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    fn targets(&self, patch: &StoryPatch) -> bool {
        matches!(
            (self.fail_on, patch),
            (SweepPass::Stories, StoryPatch::ClearOwner(_))
                | (SweepPass::Comments, StoryPatch::ClearCommentAuthor(_))
        )
    }
}

#[async_trait]
impl DocumentStore<Story> for FlakyStore {
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
        self.inner.patch_by_id(id, patch).await
    }

    async fn bulk_update(&self, filter: &StoryFilter, patch: &StoryPatch) -> StoreResult<BulkUpdate> {
        if self.targets(patch) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let failed = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failed {
                return Err(self.error.clone());
            }
        }
        self.inner.bulk_update(filter, patch).await
    }

    async fn delete_by_id(&self, id: &RecordId) -> StoreResult<Option<Story>> {
        self.inner.delete_by_id(id).await
    }
}
