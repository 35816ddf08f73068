//! Data access for the dashboard pipeline.
//!
//! Implements [`RecordSource`] for [`AnimalShelter`]: backend failures are
//! logged here and turned into an empty row set, so nothing downstream ever
//! sees an error. A limit of 0 means no limit.

use async_trait::async_trait;
use shelter_core::{Query, Record, RecordSource};
use tracing::{debug, warn};

use crate::shelter::AnimalShelter;

#[async_trait]
impl RecordSource for AnimalShelter {
    async fn fetch_records(&self, query: &Query, limit: usize) -> Vec<Record> {
        let result = if limit == 0 {
            self.read(query).await
        } else {
            self.read_limited(query, limit).await
        };
        match result {
            Ok(rows) => {
                debug!(collection = self.collection(), rows = rows.len(), limit, "records fetched");
                rows
            }
            Err(err) => {
                warn!(
                    collection = self.collection(),
                    error = %err,
                    query = %query.to_document(),
                    "record fetch failed, returning empty row set"
                );
                Vec::new()
            }
        }
    }
}
