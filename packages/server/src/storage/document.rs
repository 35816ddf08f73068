//! Document types for the storage layer.
//!
//! Defines the unit stored in a [`StorageEngine`](super::StorageEngine):
//! [`Document`] (record fields + id + [`DocumentMetadata`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use shelter_core::Record;

/// Opaque document identifier (UUID v4 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Metadata tracked for every stored document.
///
/// Server-internal: never part of the record fields returned to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Insertion sequence number. Defines collection order and survives updates.
    pub sequence: u64,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(sequence: u64) -> Self {
        Self { sequence }
    }
}

/// A stored record together with its id and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub record: Record,
    pub metadata: DocumentMetadata,
}
