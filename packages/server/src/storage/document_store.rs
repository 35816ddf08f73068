//! Document collection trait.
//!
//! [`DocumentStore`] is the backend seam the CRUD layer talks to: a single
//! named collection supporting find / insert / update / delete / count with
//! structured [`Query`] filters.

use async_trait::async_trait;
use shelter_core::{Query, Record};

use super::document::DocumentId;

/// Errors surfaced by a [`DocumentStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection {collection} is unavailable")]
    Unavailable { collection: String },
    #[error("internal store error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A named collection of documents.
///
/// Used as `Arc<dyn DocumentStore>`, constructed once and injected into
/// its owners.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the collection this store manages.
    fn collection(&self) -> &str;

    /// Inserts a record as a new document and returns its id.
    async fn insert_one(&self, record: Record) -> Result<DocumentId, StoreError>;

    /// Returns matching records in collection order, at most `limit` if given.
    async fn find(&self, query: &Query, limit: Option<usize>) -> Result<Vec<Record>, StoreError>;

    /// Counts matching documents.
    async fn count(&self, query: &Query) -> Result<u64, StoreError>;

    /// Applies `set` to the first (or every, if `multiple`) matching document.
    ///
    /// Returns how many documents actually changed; a match whose fields
    /// already hold the new values is not counted.
    async fn update(&self, query: &Query, set: &Record, multiple: bool)
        -> Result<u64, StoreError>;

    /// Deletes the first (or every, if `multiple`) matching document.
    async fn delete(&self, query: &Query, multiple: bool) -> Result<u64, StoreError>;

    /// Inserts `record` only if no document matches `filter`.
    ///
    /// Returns the new id, or `None` when a match already existed. The check
    /// and the insert are atomic with respect to other calls on this store.
    async fn insert_if_absent(
        &self,
        filter: &Query,
        record: Record,
    ) -> Result<Option<DocumentId>, StoreError>;
}
