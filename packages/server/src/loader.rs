//! Bulk CSV import into the animal collection.
//!
//! Each row becomes a [`Record`] keyed by the CSV header. Cells are typed on
//! the way in so numeric fields (ages, coordinates) compare as numbers.
//! Import is idempotent: a row is inserted only if no document with the same
//! `animal_id` exists yet.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use shelter_core::{fields, Query, Record, Value};
use tracing::{debug, info, instrument};

use crate::shelter::{AnimalShelter, CrudError};

/// Errors from [`import_csv`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Crud(#[from] CrudError),
}

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    /// Rows inserted as new documents.
    pub inserted: usize,
    /// Rows without an `animal_id`, or whose id was already present.
    pub skipped: usize,
    /// Data rows read.
    pub total: usize,
}

/// Types one CSV cell.
#[must_use]
pub fn parse_cell(raw: &str) -> Value {
    let cell = raw.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Value::Int(n);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_nan() => Value::Null,
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::String(cell.to_string()),
    }
}

/// Reads every data row of a headed CSV into records.
///
/// # Errors
///
/// `Csv` if the header or a row cannot be decoded.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>, LoadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_string(), parse_cell(cell)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Inserts records whose `animal_id` is not yet in the collection.
///
/// # Errors
///
/// `Crud` on the first backend failure; rows before it stay inserted.
pub async fn import_records(
    shelter: &AnimalShelter,
    records: Vec<Record>,
) -> Result<ImportSummary, LoadError> {
    let mut summary = ImportSummary {
        total: records.len(),
        ..ImportSummary::default()
    };

    for record in records {
        let Some(id) = record
            .get_present(fields::ANIMAL_ID)
            .filter(|id| !id.to_text().trim().is_empty())
            .cloned()
        else {
            summary.skipped += 1;
            continue;
        };

        let filter = Query::where_equals(&Record::new().with(fields::ANIMAL_ID, id));
        match shelter.insert_if_absent(&filter, record).await? {
            Some(_) => summary.inserted += 1,
            None => summary.skipped += 1,
        }
    }
    Ok(summary)
}

/// Imports a CSV file into the shelter collection.
///
/// # Errors
///
/// `Io` if the file cannot be opened, `Csv` on a decoding failure, `Crud`
/// on a backend failure.
#[instrument(skip(shelter, path), fields(path = %path.as_ref().display(), collection = shelter.collection()))]
pub async fn import_csv(
    shelter: &AnimalShelter,
    path: impl AsRef<Path>,
) -> Result<ImportSummary, LoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let records = read_records(file)?;
    debug!(rows = records.len(), "csv decoded");

    let summary = import_records(shelter, records).await?;
    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        total = summary.total,
        "csv import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryDocumentStore;

    const SAMPLE: &str = "\
animal_id,animal_type,breed,name,age_upon_outcome_in_weeks,location_lat,location_long
A1,Dog,Labrador Retriever Mix,Bella,52,30.75,-97.48
A2,Dog,Beagle,,10.5,NaN,-97.3
,Cat,Domestic Shorthair,Tom,20,30.1,-97.6
A1,Dog,Duplicate,Again,1,30.0,-97.0
";

    fn shelter() -> AnimalShelter {
        AnimalShelter::new(Arc::new(MemoryDocumentStore::new("animals")))
    }

    #[test]
    fn cells_are_typed() {
        assert_eq!(parse_cell(""), Value::Null);
        assert_eq!(parse_cell("  "), Value::Null);
        assert_eq!(parse_cell("52"), Value::Int(52));
        assert_eq!(parse_cell("-97.48"), Value::Float(-97.48));
        assert_eq!(parse_cell("NaN"), Value::Null);
        assert_eq!(parse_cell("inf"), Value::String("inf".to_string()));
        assert_eq!(parse_cell("Beagle"), Value::String("Beagle".to_string()));
    }

    #[test]
    fn rows_keep_header_order() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);
        let names: Vec<&str> = records[0].field_names().collect();
        assert_eq!(names[0], "animal_id");
        assert_eq!(names[6], "location_long");
        assert!(records[1].get("name").unwrap().is_null());
        assert!(records[1].get("location_lat").unwrap().is_null());
    }

    #[tokio::test]
    async fn import_skips_missing_and_duplicate_ids() {
        let shelter = shelter();
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        let summary = import_records(&shelter, records).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                inserted: 2,
                skipped: 2,
                total: 4
            }
        );
        let stored = shelter.read_all().await.unwrap();
        assert_eq!(stored[0].get_str("breed"), Some("Labrador Retriever Mix"));
    }

    #[tokio::test]
    async fn import_csv_file_is_idempotent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let shelter = shelter();

        let first = import_csv(&shelter, file.path()).await.unwrap();
        assert_eq!(first.inserted, 2);
        let second = import_csv(&shelter, file.path()).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 4);
        assert_eq!(shelter.count(&Query::match_all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = import_csv(&shelter(), "/nonexistent/animals.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
