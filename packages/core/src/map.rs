//! Map view for the selected row.

use serde::{Deserialize, Serialize};

use crate::types::{fields, Record};

/// Austin, TX. Used whenever the selected row has no usable coordinates.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 30.2672,
    lon: -97.7431,
};

/// Zoom level for the empty, marker-less map.
pub const OVERVIEW_ZOOM: u8 = 10;

/// Zoom level when a marker is shown.
pub const MARKER_ZOOM: u8 = 12;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A map pin with its hover label and popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub position: GeoPoint,
    /// Tooltip text: the animal's breed.
    pub label: String,
    pub popup_title: String,
    /// Popup text: the animal's name.
    pub popup_body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub marker: Option<Marker>,
}

impl MapView {
    /// The default-centered map with no marker.
    #[must_use]
    pub fn overview() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: OVERVIEW_ZOOM,
            marker: None,
        }
    }
}

/// Resolves a selection against a row set of length `len`.
///
/// No selection means the first row; an out-of-range selection clamps to
/// the last row. Returns `None` for an empty row set.
#[must_use]
pub fn effective_index(len: usize, selected: Option<usize>) -> Option<usize> {
    let last = len.checked_sub(1)?;
    Some(selected.map_or(0, |i| i.min(last)))
}

/// Builds the map view for the selected row.
///
/// Coordinates come from `location_lat`/`location_long`; numeric strings are
/// accepted, while missing, null or non-finite values fall back to
/// [`DEFAULT_CENTER`]. The marker is still placed in that case.
#[must_use]
pub fn selected_point(rows: &[Record], selected: Option<usize>) -> MapView {
    let Some(index) = effective_index(rows.len(), selected) else {
        return MapView::overview();
    };
    let row = &rows[index];

    let lat = row.get(fields::LOCATION_LAT).and_then(|v| v.parse_finite());
    let lon = row.get(fields::LOCATION_LONG).and_then(|v| v.parse_finite());
    let center = match (lat, lon) {
        (Some(lat), Some(lon)) => GeoPoint { lat, lon },
        _ => DEFAULT_CENTER,
    };

    MapView {
        center,
        zoom: MARKER_ZOOM,
        marker: Some(Marker {
            position: center,
            label: text_or_unknown(row, fields::BREED),
            popup_title: "Animal".to_string(),
            popup_body: text_or_unknown(row, fields::NAME),
        }),
    }
}

fn text_or_unknown(row: &Record, field: &str) -> String {
    row.get_present(field)
        .map_or_else(|| UNKNOWN.to_string(), crate::types::Value::to_text)
}
