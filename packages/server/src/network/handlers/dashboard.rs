//! Dashboard endpoints: one-shot renders and event-driven sessions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shelter_core::{ColumnFilter, FilterSelection, SortKey};

use super::{ApiError, AppState};
use crate::dashboard::{DashboardEvent, DashboardState, DashboardView};

/// Query string of `GET /api/dashboard`.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub filter: Option<String>,
    pub search: Option<String>,
    pub selected: Option<usize>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    /// Comma list of `column` or `-column`.
    pub sort: Option<String>,
    /// Header filters: `{breed} contains lab && {age_upon_outcome_in_weeks} > 52`.
    pub filter_query: Option<String>,
}

impl From<DashboardParams> for DashboardState {
    fn from(params: DashboardParams) -> Self {
        Self {
            filter: FilterSelection::from_ui_value(params.filter.as_deref()),
            search: params.search,
            selected_row: params.selected,
            column_filters: params
                .filter_query
                .as_deref()
                .map(ColumnFilter::parse_list)
                .unwrap_or_default(),
            sort: params
                .sort
                .as_deref()
                .map(SortKey::parse_list)
                .unwrap_or_default(),
            page: params.page.unwrap_or(0),
            page_size: params.page_size,
        }
    }
}

/// Body of `POST /api/sessions`.
#[derive(Debug, Serialize)]
pub struct SessionOpened {
    pub session_id: String,
    pub view: DashboardView,
}

/// `GET /api/dashboard`
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Json<DashboardView> {
    Json(state.dashboard.render(params.into()).await)
}

/// `POST /api/sessions`
pub async fn open_session_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionOpened>) {
    let (session_id, view) = state.dashboard.open_session().await;
    (StatusCode::CREATED, Json(SessionOpened { session_id, view }))
}

/// `POST /api/sessions/{id}/events`
pub async fn apply_event_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<DashboardEvent>,
) -> Result<Json<DashboardView>, ApiError> {
    state
        .dashboard
        .apply_event(&id, event)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::unknown_session(&id))
}

/// `GET /api/sessions/{id}`
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DashboardView>, ApiError> {
    state
        .dashboard
        .current_view(&id)
        .map(Json)
        .ok_or_else(|| ApiError::unknown_session(&id))
}

/// `DELETE /api/sessions/{id}`
pub async fn close_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.dashboard.close_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::unknown_session(&id))
    }
}
