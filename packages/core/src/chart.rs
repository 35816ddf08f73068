//! Top-breeds bar chart derived from a row set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{fields, Record};

/// Number of bars the dashboard shows by default.
pub const DEFAULT_TOP_N: usize = 10;

/// One bar: a breed label and how many rows carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedCount {
    pub label: String,
    pub count: usize,
}

impl BreedCount {
    #[must_use]
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Renderable summary of the most frequent breeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreedChart {
    /// Nothing to plot; the UI shows a placeholder.
    NoData,
    /// Horizontal bars, smallest count first.
    Bars {
        title: String,
        x_label: String,
        y_label: String,
        bars: Vec<BreedCount>,
    },
}

impl BreedChart {
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// Bars in display order; empty for [`BreedChart::NoData`].
    #[must_use]
    pub fn bars(&self) -> &[BreedCount] {
        match self {
            Self::NoData => &[],
            Self::Bars { bars, .. } => bars,
        }
    }
}

/// Counts `breed` values and keeps the `n` most frequent.
///
/// Ranking is by count descending; equal counts keep the order in which the
/// breeds were first seen. The kept bars are then re-ordered ascending by
/// count for display, tied bars staying in ranking order.
///
/// Rows without a `breed` (or with a null one) are not counted. If no row
/// has one, or `n` is zero, the result is [`BreedChart::NoData`].
#[must_use]
pub fn top_breeds(rows: &[Record], n: usize) -> BreedChart {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for breed in rows.iter().filter_map(|row| row.get_present(fields::BREED)) {
        *counts.entry(breed.to_text()).or_default() += 1;
    }

    if counts.is_empty() || n == 0 {
        return BreedChart::NoData;
    }

    let mut ranked: Vec<BreedCount> = counts
        .into_iter()
        .map(|(label, count)| BreedCount { label, count })
        .collect();
    // Stable sort: ties keep first-occurrence order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked.sort_by_key(|bar| bar.count);

    BreedChart::Bars {
        title: "Top Breeds".to_string(),
        x_label: "Count".to_string(),
        y_label: "Breed".to_string(),
        bars: ranked,
    }
}
