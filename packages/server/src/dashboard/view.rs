//! Dashboard UI state, events, and the derive step.

use serde::{Deserialize, Serialize};
use shelter_core::{
    apply_text_filter, build_query, filter_rows, paginate, selected_point, sort_rows, top_breeds,
    BreedChart, ColumnFilter, FilterSelection, MapView, Record, RecordSource, SortKey, TablePage,
};

use super::config::DashboardConfig;

/// Everything the UI controls: filter, search box, selected row, column
/// filters, sort and paging.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardState {
    #[serde(default)]
    pub filter: FilterSelection,
    #[serde(default)]
    pub search: Option<String>,
    /// Index into the sorted, filtered view (all pages).
    #[serde(default)]
    pub selected_row: Option<usize>,
    /// Header filters, at most one per column.
    #[serde(default)]
    pub column_filters: Vec<ColumnFilter>,
    #[serde(default)]
    pub sort: Vec<SortKey>,
    #[serde(default)]
    pub page: usize,
    /// Overrides the configured rows per page.
    #[serde(default)]
    pub page_size: Option<usize>,
}

/// A UI change delivered to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    FilterChanged {
        #[serde(default)]
        filter: FilterSelection,
    },
    SearchChanged { text: Option<String> },
    SelectionChanged { row: Option<usize> },
    /// Sets the header filter of `column`; a blank or absent `expr` clears it.
    ColumnFilterChanged {
        column: String,
        #[serde(default)]
        expr: Option<String>,
    },
    SortChanged { sort: Vec<SortKey> },
    PageChanged { page: usize },
    /// Re-run the query with the current state.
    Refresh,
}

impl DashboardEvent {
    /// Whether the event changes which rows the query returns.
    #[must_use]
    pub fn requires_refetch(&self) -> bool {
        matches!(
            self,
            Self::FilterChanged { .. } | Self::SearchChanged { .. } | Self::Refresh
        )
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FilterChanged { .. } => "filter_changed",
            Self::SearchChanged { .. } => "search_changed",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::ColumnFilterChanged { .. } => "column_filter_changed",
            Self::SortChanged { .. } => "sort_changed",
            Self::PageChanged { .. } => "page_changed",
            Self::Refresh => "refresh",
        }
    }
}

impl DashboardState {
    /// Folds an event into the state.
    ///
    /// A new filter, search text or column filter returns the table to its
    /// first page.
    /// The selected row is kept; the map deriver clamps it.
    pub fn apply(&mut self, event: &DashboardEvent) {
        match event {
            DashboardEvent::FilterChanged { filter } => {
                self.filter = *filter;
                self.page = 0;
            }
            DashboardEvent::SearchChanged { text } => {
                self.search.clone_from(text);
                self.page = 0;
            }
            DashboardEvent::SelectionChanged { row } => self.selected_row = *row,
            DashboardEvent::ColumnFilterChanged { column, expr } => {
                self.column_filters.retain(|f| f.column != *column);
                if let Some(expr) = expr.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
                    self.column_filters.push(ColumnFilter::new(column.clone(), expr));
                }
                self.page = 0;
            }
            DashboardEvent::SortChanged { sort } => self.sort.clone_from(sort),
            DashboardEvent::PageChanged { page } => self.page = *page,
            DashboardEvent::Refresh => {}
        }
    }
}

/// The table, chart and map derived from one row set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedOutputs {
    pub table: TablePage,
    pub chart: BreedChart,
    pub map: MapView,
}

/// Full response for one dashboard render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub generation: u64,
    pub state: DashboardState,
    pub table: TablePage,
    pub chart: BreedChart,
    pub map: MapView,
}

/// Runs the rescue query for the state's filter and applies its search text.
pub async fn fetch_filtered(
    source: &dyn RecordSource,
    state: &DashboardState,
    config: &DashboardConfig,
) -> Vec<Record> {
    let query = build_query(state.filter);
    let rows = source.fetch_records(&query, config.fetch_limit).await;
    apply_text_filter(&rows, state.search.as_deref())
}

/// Applies the column filters and sort as the table shows them, then derives
/// every output from that view. The chart and map see all pages, not only
/// the visible one.
#[must_use]
pub fn derive_outputs(
    rows: &[Record],
    state: &DashboardState,
    config: &DashboardConfig,
) -> DerivedOutputs {
    let view_rows = sort_rows(&filter_rows(rows, &state.column_filters), &state.sort);
    DerivedOutputs {
        table: paginate(
            &view_rows,
            state.page,
            state.page_size.unwrap_or(config.page_size),
        ),
        chart: top_breeds(&view_rows, config.top_n),
        map: selected_point(&view_rows, state.selected_row),
    }
}

#[cfg(test)]
mod tests {
    use shelter_core::{GeoPoint, SortKey};

    use super::*;

    fn dog(name: &str, breed: &str, lat: f64) -> Record {
        Record::new()
            .with("name", name)
            .with("breed", breed)
            .with("location_lat", lat)
            .with("location_long", -97.0)
    }

    #[test]
    fn filter_and_search_reset_page() {
        let mut state = DashboardState {
            page: 4,
            selected_row: Some(3),
            ..DashboardState::default()
        };
        state.apply(&DashboardEvent::FilterChanged {
            filter: FilterSelection::WaterRescue,
        });
        assert_eq!(state.page, 0);
        assert_eq!(state.filter, FilterSelection::WaterRescue);
        assert_eq!(state.selected_row, Some(3));

        state.apply(&DashboardEvent::PageChanged { page: 2 });
        state.apply(&DashboardEvent::SearchChanged {
            text: Some("lab".to_string()),
        });
        assert_eq!(state.page, 0);
        assert_eq!(state.search.as_deref(), Some("lab"));
    }

    #[test]
    fn only_row_changing_events_refetch() {
        assert!(DashboardEvent::Refresh.requires_refetch());
        assert!(DashboardEvent::SearchChanged { text: None }.requires_refetch());
        assert!(!DashboardEvent::SelectionChanged { row: Some(1) }.requires_refetch());
        assert!(!DashboardEvent::PageChanged { page: 1 }.requires_refetch());
        assert!(!DashboardEvent::SortChanged { sort: vec![] }.requires_refetch());
        assert!(!DashboardEvent::ColumnFilterChanged {
            column: "breed".to_string(),
            expr: None,
        }
        .requires_refetch());
    }

    #[test]
    fn column_filter_events_replace_and_clear() {
        let mut state = DashboardState {
            page: 3,
            ..DashboardState::default()
        };
        let set = |expr: Option<&str>| DashboardEvent::ColumnFilterChanged {
            column: "breed".to_string(),
            expr: expr.map(str::to_string),
        };
        state.apply(&set(Some("contains lab")));
        assert_eq!(state.page, 0);
        state.apply(&set(Some(" = Pug ")));
        assert_eq!(state.column_filters, vec![ColumnFilter::new("breed", "= Pug")]);
        state.apply(&set(Some("  ")));
        assert!(state.column_filters.is_empty());
        state.apply(&set(Some("Pug")));
        state.apply(&set(None));
        assert!(state.column_filters.is_empty());

        let event: DashboardEvent =
            serde_json::from_str(r#"{"type":"column_filter_changed","column":"breed"}"#).unwrap();
        assert_eq!(event, set(None));
        assert_eq!(event.kind(), "column_filter_changed");
    }

    #[test]
    fn chart_and_map_follow_column_filters() {
        let rows = vec![
            dog("Amy", "Lab", 30.1),
            dog("Bo", "Pug", 30.2),
            dog("Cy", "Lab", 30.3),
        ];
        let state = DashboardState {
            column_filters: vec![ColumnFilter::new("breed", "= pug")],
            selected_row: Some(0),
            ..DashboardState::default()
        };
        let outputs = derive_outputs(&rows, &state, &DashboardConfig::default());
        assert_eq!(outputs.table.total_rows, 1);
        assert_eq!(outputs.chart.bars().len(), 1);
        assert_eq!(outputs.chart.bars()[0].label, "Pug");
        assert_eq!(outputs.map.center, GeoPoint { lat: 30.2, lon: -97.0 });
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let event: DashboardEvent =
            serde_json::from_str(r#"{"type":"filter_changed","filter":"Mountain"}"#).unwrap();
        assert_eq!(
            event,
            DashboardEvent::FilterChanged {
                filter: FilterSelection::MountainRescue
            }
        );
        let event: DashboardEvent = serde_json::from_str(
            r#"{"type":"sort_changed","sort":[{"column":"breed","direction":"desc"}]}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            DashboardEvent::SortChanged {
                sort: vec![SortKey::desc("breed")]
            }
        );
    }

    #[test]
    fn null_or_missing_filter_means_reset() {
        for raw in [
            r#"{"type":"filter_changed","filter":null}"#,
            r#"{"type":"filter_changed"}"#,
        ] {
            let event: DashboardEvent = serde_json::from_str(raw).unwrap();
            assert_eq!(
                event,
                DashboardEvent::FilterChanged {
                    filter: FilterSelection::Reset
                }
            );
        }
    }

    #[test]
    fn selection_indexes_the_sorted_view() {
        let rows = vec![dog("Zed", "Pug", 30.1), dog("Amy", "Lab", 30.2)];
        let state = DashboardState {
            sort: vec![SortKey::asc("name")],
            selected_row: Some(0),
            ..DashboardState::default()
        };
        let outputs = derive_outputs(&rows, &state, &DashboardConfig::default());
        assert_eq!(outputs.map.center, GeoPoint { lat: 30.2, lon: -97.0 });
        assert_eq!(outputs.table.rows[0].get_str("name"), Some("Amy"));
    }

    #[test]
    fn chart_covers_every_page() {
        let rows: Vec<Record> = (0..25).map(|i| dog(&format!("d{i}"), "Pug", 30.0)).collect();
        let config = DashboardConfig {
            page_size: 5,
            ..DashboardConfig::default()
        };
        let outputs = derive_outputs(&rows, &DashboardState::default(), &config);
        assert_eq!(outputs.table.rows.len(), 5);
        assert_eq!(outputs.chart.bars()[0].count, 25);

        let state = DashboardState {
            page_size: Some(20),
            ..DashboardState::default()
        };
        assert_eq!(derive_outputs(&rows, &state, &config).table.rows.len(), 20);
    }

    #[test]
    fn empty_rows_render_placeholders() {
        let outputs = derive_outputs(&[], &DashboardState::default(), &DashboardConfig::default());
        assert!(outputs.chart.is_no_data());
        assert!(outputs.map.marker.is_none());
        assert_eq!(outputs.table.total_rows, 0);
    }
}
