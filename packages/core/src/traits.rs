use async_trait::async_trait;

use crate::query::Query;
use crate::types::Record;

/// Data access consumed by the dashboard pipeline.
///
/// Implementations translate a [`Query`] into a backend call and return a
/// snapshot of at most `limit` matching records in collection order. A
/// backend failure yields an empty row set; implementations log it and
/// never surface it to the pipeline.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self, query: &Query, limit: usize) -> Vec<Record>;
}
