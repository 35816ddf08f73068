//! Document storage for the shelter server.
//!
//! Two layers:
//!
//! - **Layer 1** ([`StorageEngine`]): keyed in-memory document storage with
//!   ordered snapshots
//! - **Layer 2** ([`DocumentStore`]): a named collection answering
//!   structured queries, implemented by [`MemoryDocumentStore`]

pub mod datastores;
pub mod document;
pub mod document_store;
pub mod engine;
pub mod engines;

pub use datastores::MemoryDocumentStore;
pub use document::*;
pub use document_store::*;
pub use engine::*;
pub use engines::HashMapStorage;
