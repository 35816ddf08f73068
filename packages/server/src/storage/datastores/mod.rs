//! [`DocumentStore`](super::DocumentStore) implementations.
//!
//! Currently includes [`MemoryDocumentStore`], an in-memory collection over
//! a [`StorageEngine`](super::StorageEngine).

mod memory;

pub use memory::MemoryDocumentStore;
