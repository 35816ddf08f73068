//! Low-level storage engine trait.
//!
//! Defines [`StorageEngine`], the innermost storage layer: a keyed map of
//! [`Document`]s that can produce an ordered point-in-time snapshot.

use super::document::{Document, DocumentId};

/// Keyed in-memory document storage.
///
/// All operations are synchronous. Wrapped in `Arc<dyn StorageEngine>` for
/// sharing across async boundaries.
pub trait StorageEngine: Send + Sync + 'static {
    /// Insert or replace a document. Returns the previous one if any.
    fn put(&self, document: Document) -> Option<Document>;

    fn remove(&self, id: &DocumentId) -> Option<Document>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool;

    /// Point-in-time copy of every document, ordered by insertion sequence.
    ///
    /// Concurrent modifications do not fail the snapshot.
    fn snapshot(&self) -> Vec<Document>;
}
