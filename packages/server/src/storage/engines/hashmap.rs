//! In-memory [`StorageEngine`] implementation backed by [`DashMap`].
//!
//! Provides concurrent read/write access without external locking.

use dashmap::DashMap;

use crate::storage::document::{Document, DocumentId};
use crate::storage::engine::StorageEngine;

/// In-memory storage backed by [`DashMap`].
///
/// `DashMap` iteration order is arbitrary, so [`snapshot`](StorageEngine::snapshot)
/// re-sorts by each document's insertion sequence.
pub struct HashMapStorage {
    entries: DashMap<DocumentId, Document>,
}

impl HashMapStorage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for HashMapStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for HashMapStorage {
    fn put(&self, document: Document) -> Option<Document> {
        self.entries.insert(document.id.clone(), document)
    }

    fn remove(&self, id: &DocumentId) -> Option<Document> {
        self.entries.remove(id).map(|(_, d)| d)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn snapshot(&self) -> Vec<Document> {
        let mut documents: Vec<Document> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        documents.sort_by_key(|d| d.metadata.sequence);
        documents
    }
}

#[cfg(test)]
mod tests {
    use shelter_core::Record;

    use super::*;
    use crate::storage::document::DocumentMetadata;

    fn make_document(id: &str, sequence: u64) -> Document {
        Document {
            id: DocumentId::from(id),
            record: Record::new().with("animal_id", id),
            metadata: DocumentMetadata::new(sequence),
        }
    }

    #[test]
    fn put_then_remove() {
        let storage = HashMapStorage::new();
        let doc = make_document("A1", 0);
        assert!(storage.put(doc.clone()).is_none());
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.remove(&doc.id), Some(doc.clone()));
        assert!(storage.remove(&doc.id).is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn put_returns_previous_document() {
        let storage = HashMapStorage::new();
        storage.put(make_document("A1", 0));
        let previous = storage.put(make_document("A1", 5));
        assert_eq!(previous.map(|d| d.metadata.sequence), Some(0));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn snapshot_is_in_sequence_order() {
        let storage = HashMapStorage::new();
        for (id, seq) in [("c", 2), ("a", 0), ("d", 3), ("b", 1)] {
            storage.put(make_document(id, seq));
        }
        let ids: Vec<String> = storage
            .snapshot()
            .into_iter()
            .map(|d| d.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }
}
