//! In-memory [`DocumentStore`] over a [`StorageEngine`].
//!
//! Queries are evaluated with [`Query::compile`] against an ordered engine
//! snapshot. Writes that must observe-then-modify (update, delete,
//! insert-if-absent) are serialized by a per-collection write lock; reads
//! never take it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shelter_core::{Query, Record};
use tracing::debug;

use crate::storage::document::{Document, DocumentId, DocumentMetadata};
use crate::storage::document_store::{DocumentStore, StoreError};
use crate::storage::engine::StorageEngine;
use crate::storage::engines::HashMapStorage;

pub struct MemoryDocumentStore {
    collection: String,
    engine: Arc<dyn StorageEngine>,
    next_sequence: AtomicU64,
    write_lock: Mutex<()>,
}

impl MemoryDocumentStore {
    /// Creates an empty collection backed by a fresh [`HashMapStorage`].
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self::with_engine(collection, Arc::new(HashMapStorage::new()))
    }

    #[must_use]
    pub fn with_engine(collection: impl Into<String>, engine: Arc<dyn StorageEngine>) -> Self {
        let next_sequence = engine
            .snapshot()
            .last()
            .map_or(0, |d| d.metadata.sequence + 1);
        Self {
            collection: collection.into(),
            engine,
            next_sequence: AtomicU64::new(next_sequence),
            write_lock: Mutex::new(()),
        }
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.engine.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    fn insert(&self, record: Record) -> DocumentId {
        let id = DocumentId::generate();
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.engine.put(Document {
            id: id.clone(),
            record,
            metadata: DocumentMetadata::new(sequence),
        });
        id
    }

    fn matching(&self, query: &Query) -> impl Iterator<Item = Document> {
        let matcher = query.compile();
        self.engine
            .snapshot()
            .into_iter()
            .filter(move |d| matcher.matches(&d.record))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn insert_one(&self, record: Record) -> Result<DocumentId, StoreError> {
        Ok(self.insert(record))
    }

    async fn find(&self, query: &Query, limit: Option<usize>) -> Result<Vec<Record>, StoreError> {
        let records = self
            .matching(query)
            .take(limit.unwrap_or(usize::MAX))
            .map(|d| d.record)
            .collect();
        Ok(records)
    }

    async fn count(&self, query: &Query) -> Result<u64, StoreError> {
        Ok(self.matching(query).count() as u64)
    }

    async fn update(
        &self,
        query: &Query,
        set: &Record,
        multiple: bool,
    ) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock();
        let limit = if multiple { usize::MAX } else { 1 };
        let mut modified = 0;

        for mut document in self.matching(query).take(limit).collect::<Vec<_>>() {
            let before = document.record.clone();
            document.record.merge(set);
            if document.record != before {
                self.engine.put(document);
                modified += 1;
            }
        }

        debug!(collection = %self.collection, modified, "update applied");
        Ok(modified)
    }

    async fn delete(&self, query: &Query, multiple: bool) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock();
        let limit = if multiple { usize::MAX } else { 1 };
        let ids: Vec<DocumentId> = self.matching(query).take(limit).map(|d| d.id).collect();

        let deleted = ids
            .iter()
            .filter(|id| self.engine.remove(id).is_some())
            .count() as u64;

        debug!(collection = %self.collection, deleted, "delete applied");
        Ok(deleted)
    }

    async fn insert_if_absent(
        &self,
        filter: &Query,
        record: Record,
    ) -> Result<Option<DocumentId>, StoreError> {
        let _guard = self.write_lock.lock();
        if self.matching(filter).next().is_some() {
            return Ok(None);
        }
        Ok(Some(self.insert(record)))
    }
}
