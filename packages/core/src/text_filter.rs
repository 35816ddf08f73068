//! Free-text search across every field of an already-fetched row set.

use crate::types::Record;

/// Keeps the rows whose lowercased, space-joined field values contain `text`.
///
/// The search text is trimmed and lowercased first. Absent or blank text,
/// or an empty row set, returns the rows unchanged. Relative order is kept.
#[must_use]
pub fn apply_text_filter(rows: &[Record], text: Option<&str>) -> Vec<Record> {
    let needle = text.map(str::trim).unwrap_or_default().to_lowercase();
    if needle.is_empty() || rows.is_empty() {
        return rows.to_vec();
    }

    let kept: Vec<Record> = rows
        .iter()
        .filter(|row| searchable_text(row).contains(&needle))
        .cloned()
        .collect();

    tracing::trace!(
        search = %needle,
        scanned = rows.len(),
        kept = kept.len(),
        "text filter applied"
    );
    kept
}

/// Lowercased concatenation of a row's values in field order.
fn searchable_text(row: &Record) -> String {
    row.values()
        .map(crate::types::Value::to_text)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::types::Value;

    fn rows() -> Vec<Record> {
        vec![
            Record::new().with("name", "Bella").with("breed", "Labrador Retriever Mix"),
            Record::new().with("name", "Max").with("breed", "Pit Bull"),
            Record::new()
                .with("name", Value::Null)
                .with("breed", "Chesapeake Bay Retriever")
                .with("age_upon_outcome_in_weeks", 52),
        ]
    }

    #[test]
    fn empty_text_is_identity() {
        let rows = rows();
        assert_eq!(apply_text_filter(&rows, Some("")), rows);
        assert_eq!(apply_text_filter(&rows, Some("   ")), rows);
        assert_eq!(apply_text_filter(&rows, None), rows);
    }

    #[test]
    fn empty_rows_stay_empty() {
        assert!(apply_text_filter(&[], Some("lab")).is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let rows = rows();
        let kept = apply_text_filter(&rows, Some("labrador"));
        assert_eq!(kept, vec![rows[0].clone()]);
        let kept = apply_text_filter(&rows, Some("  PIT bull "));
        assert_eq!(kept, vec![rows[1].clone()]);
    }

    #[test]
    fn search_spans_fields_and_numbers() {
        let rows = rows();
        assert_eq!(apply_text_filter(&rows, Some("retriever")).len(), 2);
        assert_eq!(apply_text_filter(&rows, Some("52")), vec![rows[2].clone()]);
        // Adjacent field values are joined with a single space.
        assert_eq!(apply_text_filter(&rows, Some("max pit")), vec![rows[1].clone()]);
    }

    #[test]
    fn null_values_are_not_searchable_as_text() {
        let rows = rows();
        assert!(apply_text_filter(&rows, Some("null")).is_empty());
    }

    fn arb_row() -> impl Strategy<Value = Record> {
        prop::collection::vec(("[a-c]{1,2}", "[a-zA-Z ]{0,8}"), 0..4)
            .prop_map(|pairs| pairs.into_iter().collect())
    }

    proptest! {
        #[test]
        fn output_is_an_ordered_subsequence(
            rows in prop::collection::vec(arb_row(), 0..12),
            text in "[a-zA-Z]{1,3}",
        ) {
            let kept = apply_text_filter(&rows, Some(&text));
            let mut source = rows.iter();
            for row in &kept {
                prop_assert!(source.any(|candidate| candidate == row));
            }
        }

        #[test]
        fn every_kept_row_contains_the_text(
            rows in prop::collection::vec(arb_row(), 0..12),
            text in "[a-zA-Z]{1,3}",
        ) {
            let needle = text.to_lowercase();
            for row in apply_text_filter(&rows, Some(&text)) {
                prop_assert!(searchable_text(&row).contains(&needle));
            }
        }

        #[test]
        fn blank_text_keeps_everything(rows in prop::collection::vec(arb_row(), 0..12)) {
            prop_assert_eq!(apply_text_filter(&rows, Some(" ")), rows);
        }
    }
}
