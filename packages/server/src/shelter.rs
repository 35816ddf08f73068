//! CRUD access to the animal collection.
//!
//! [`AnimalShelter`] wraps an explicitly owned [`DocumentStore`] handle and
//! adds input validation. Every operation returns a `Result`; logging is
//! left to the caller.

use std::sync::Arc;

use shelter_core::{Query, Record};

use crate::storage::{DocumentId, DocumentStore, StoreError};

/// Errors returned by [`AnimalShelter`] operations.
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD facade over the shelter's animal collection.
#[derive(Clone)]
pub struct AnimalShelter {
    store: Arc<dyn DocumentStore>,
}

impl AnimalShelter {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Inserts a new animal document.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty record; `Store` on backend failure.
    pub async fn create(&self, data: Record) -> Result<DocumentId, CrudError> {
        if data.is_empty() {
            return Err(CrudError::InvalidInput("create() expects a non-empty document"));
        }
        Ok(self.store.insert_one(data).await?)
    }

    /// Returns every record matching `query`, in collection order.
    ///
    /// # Errors
    ///
    /// `Store` on backend failure.
    pub async fn read(&self, query: &Query) -> Result<Vec<Record>, CrudError> {
        Ok(self.store.find(query, None).await?)
    }

    /// Like [`read`](Self::read) but returns at most `limit` records.
    ///
    /// # Errors
    ///
    /// `Store` on backend failure.
    pub async fn read_limited(&self, query: &Query, limit: usize) -> Result<Vec<Record>, CrudError> {
        Ok(self.store.find(query, Some(limit)).await?)
    }

    /// Returns the whole collection.
    ///
    /// # Errors
    ///
    /// `Store` on backend failure.
    pub async fn read_all(&self) -> Result<Vec<Record>, CrudError> {
        self.read(&Query::match_all()).await
    }

    /// Sets the fields of `new_data` on the first (or every) match.
    ///
    /// Returns the number of documents modified.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the query is the empty filter or `new_data` is
    /// empty; `Store` on backend failure.
    pub async fn update(
        &self,
        query: &Query,
        new_data: &Record,
        multiple: bool,
    ) -> Result<u64, CrudError> {
        if query.is_match_all() || new_data.is_empty() {
            return Err(CrudError::InvalidInput("update() requires a query and new data"));
        }
        Ok(self.store.update(query, new_data, multiple).await?)
    }

    /// Deletes the first (or every) match. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the query is the empty filter; `Store` on
    /// backend failure.
    pub async fn delete(&self, query: &Query, multiple: bool) -> Result<u64, CrudError> {
        if query.is_match_all() {
            return Err(CrudError::InvalidInput("delete() requires a query"));
        }
        Ok(self.store.delete(query, multiple).await?)
    }

    /// Counts documents matching `query`.
    ///
    /// # Errors
    ///
    /// `Store` on backend failure.
    pub async fn count(&self, query: &Query) -> Result<u64, CrudError> {
        Ok(self.store.count(query).await?)
    }

    /// Inserts `data` unless a document already matches `filter`.
    ///
    /// Returns the new id, or `None` if a match existed.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty record; `Store` on backend failure.
    pub async fn insert_if_absent(
        &self,
        filter: &Query,
        data: Record,
    ) -> Result<Option<DocumentId>, CrudError> {
        if data.is_empty() {
            return Err(CrudError::InvalidInput("insert expects a non-empty document"));
        }
        Ok(self.store.insert_if_absent(filter, data).await?)
    }
}
