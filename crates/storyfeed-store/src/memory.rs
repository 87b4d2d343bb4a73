use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use storyfeed_types::RecordId;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BulkUpdate, Document, DocumentStore, Patched, Query};

/// In-memory, HashMap-based document store.
///
/// Intended for tests, demos and single-process deployments. All documents
/// live behind one `RwLock`; every write (including a whole bulk update)
/// runs under the write lock, so patches never interleave. Documents are
/// cloned on read and write.
pub struct InMemoryStore<D: Document> {
    documents: RwLock<HashMap<RecordId, D>>,
}

impl<D: Document> InMemoryStore<D> {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        // A poisoned map is still readable; its size is still the answer.
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<RecordId, D>>> {
        self.documents
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<RecordId, D>>> {
        self.documents
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl<D: Document> Default for InMemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject `candidate` if another document already holds its unique key.
fn check_unique<D: Document>(docs: &HashMap<RecordId, D>, candidate: &D) -> StoreResult<()> {
    let Some(key) = candidate.unique_key() else {
        return Ok(());
    };
    let taken = docs.values().any(|other| {
        other.id() != candidate.id() && other.unique_key().as_deref() == Some(key.as_str())
    });
    if taken {
        return Err(StoreError::DuplicateKey { kind: D::KIND, key });
    }
    Ok(())
}

/// [`check_unique`] for a batch of replacements, judged against the map as it
/// will look once all of them are written.
fn check_unique_batch<D: Document>(docs: &HashMap<RecordId, D>, changed: &[D]) -> StoreResult<()> {
    let keyed: Vec<(RecordId, String)> = changed
        .iter()
        .filter_map(|doc| doc.unique_key().map(|key| (doc.id(), key)))
        .collect();
    if keyed.is_empty() {
        return Ok(());
    }
    let replaced: HashMap<RecordId, &D> = changed.iter().map(|doc| (doc.id(), doc)).collect();
    for (id, key) in &keyed {
        let taken = docs
            .iter()
            .map(|(other_id, other)| replaced.get(other_id).copied().unwrap_or(other))
            .any(|other| other.id() != *id && other.unique_key().as_deref() == Some(key.as_str()));
        if taken {
            return Err(StoreError::DuplicateKey {
                kind: D::KIND,
                key: key.clone(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl<D: Document> DocumentStore<D> for InMemoryStore<D> {
    async fn find_by_id(&self, id: &RecordId) -> StoreResult<Option<D>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn find(&self, query: &Query<D>) -> StoreResult<Vec<D>> {
        let docs = self.read()?;
        let mut found: Vec<D> = docs
            .values()
            .filter(|doc| query.filter.as_ref().map_or(true, |f| doc.matches(f)))
            .cloned()
            .collect();
        drop(docs);

        match &query.sort {
            Some(sort) => found.sort_by(|a, b| D::compare(a, b, sort)),
            // HashMap order is arbitrary; fall back to id order so results
            // are stable between calls.
            None => found.sort_by_key(|doc| doc.id()),
        }
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn create(&self, document: D) -> StoreResult<D> {
        let mut docs = self.write()?;
        let id = document.id();
        if docs.contains_key(&id) {
            return Err(StoreError::AlreadyExists { kind: D::KIND, id });
        }
        check_unique(&docs, &document)?;
        docs.insert(id, document.clone());
        tracing::debug!(kind = %D::KIND, %id, "document created");
        Ok(document)
    }

    async fn patch_by_id(&self, id: &RecordId, patch: &D::Patch) -> StoreResult<Option<Patched<D>>> {
        let mut docs = self.write()?;
        let Some(current) = docs.get(id) else {
            return Ok(None);
        };
        let before = current.clone();
        let mut after = before.clone();
        if after.apply(patch) > 0 {
            check_unique(&docs, &after)?;
            docs.insert(*id, after.clone());
        }
        Ok(Some(Patched { before, after }))
    }

    async fn bulk_update(&self, filter: &D::Filter, patch: &D::Patch) -> StoreResult<BulkUpdate> {
        let mut docs = self.write()?;
        let mut summary = BulkUpdate::default();
        let mut changed = Vec::new();

        for doc in docs.values().filter(|doc| doc.matches(filter)) {
            summary.matched += 1;
            let mut updated = doc.clone();
            let elements = updated.apply(patch);
            if elements > 0 {
                summary.modified += 1;
                summary.elements += elements;
                changed.push(updated);
            }
        }

        // Check every keyed change before writing any, so a unique-key clash
        // leaves the store untouched.
        check_unique_batch(&docs, &changed)?;
        for updated in changed {
            docs.insert(updated.id(), updated);
        }

        tracing::debug!(
            kind = %D::KIND,
            matched = summary.matched,
            modified = summary.modified,
            elements = summary.elements,
            "bulk update applied"
        );
        Ok(summary)
    }

    async fn delete_by_id(&self, id: &RecordId) -> StoreResult<Option<D>> {
        Ok(self.write()?.remove(id))
    }
}

impl<D: Document> std::fmt::Debug for InMemoryStore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("kind", &D::KIND)
            .field("document_count", &self.len())
            .finish()
    }
}
