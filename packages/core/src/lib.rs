//! Shelter dashboard core: record model, rescue-category queries, free-text
//! filtering, and the table, chart and map views derived from a row set.
//!
//! Every function here is pure and total. Data access is reached only
//! through the [`RecordSource`] trait.

pub mod chart;
pub mod map;
pub mod query;
pub mod table;
pub mod text_filter;
pub mod traits;
pub mod types;

pub use chart::{top_breeds, BreedChart, BreedCount, DEFAULT_TOP_N};
pub use map::{selected_point, GeoPoint, MapView, Marker, DEFAULT_CENTER};
pub use query::{build_query, FilterSelection, Predicate, Query, QueryMatcher};
pub use table::{
    filter_rows, paginate, sort_rows, ColumnFilter, SortDirection, SortKey, TablePage,
    DEFAULT_PAGE_SIZE,
};
pub use text_filter::apply_text_filter;
pub use traits::RecordSource;
pub use types::{fields, Record, Value};
