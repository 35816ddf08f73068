//! CRUD endpoints over the animal collection.
//!
//! Filters are JSON equality objects, e.g. `{"animal_id": "A1"}`. On `GET`
//! they travel URL-encoded in the `filter` query parameter.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use shelter_core::{Query as RecordQuery, Record};

use super::{ApiError, AppState};

/// Query string of `GET /api/records` and `GET /api/records/count`.
#[derive(Debug, Default, Deserialize)]
pub struct ReadParams {
    /// JSON equality object; absent means every record.
    pub filter: Option<String>,
    pub limit: Option<usize>,
}

impl ReadParams {
    fn query(&self) -> Result<RecordQuery, ApiError> {
        match self.filter.as_deref().map(str::trim) {
            None | Some("") => Ok(RecordQuery::match_all()),
            Some(raw) => serde_json::from_str::<Record>(raw)
                .map(|filter| RecordQuery::where_equals(&filter))
                .map_err(|err| ApiError::BadRequest(format!("invalid filter: {err}"))),
        }
    }
}

/// Body of `PATCH /api/records`.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub query: Record,
    pub set: Record,
    #[serde(default)]
    pub multiple: bool,
}

/// Body of `DELETE /api/records`.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub query: Record,
    #[serde(default)]
    pub multiple: bool,
}

/// `POST /api/records`
pub async fn create_record_handler(
    State(state): State<AppState>,
    Json(record): Json<Record>,
) -> Result<(StatusCode, Json<JsonValue>), ApiError> {
    let id = state.shelter.create(record).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// `GET /api/records`
pub async fn read_records_handler(
    State(state): State<AppState>,
    Query(params): Query<ReadParams>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let query = params.query()?;
    let records = match params.limit {
        Some(limit) => state.shelter.read_limited(&query, limit).await?,
        None => state.shelter.read(&query).await?,
    };
    Ok(Json(records))
}

/// `GET /api/records/count`
pub async fn count_records_handler(
    State(state): State<AppState>,
    Query(params): Query<ReadParams>,
) -> Result<Json<JsonValue>, ApiError> {
    let count = state.shelter.count(&params.query()?).await?;
    Ok(Json(json!({ "count": count })))
}

/// `PATCH /api/records`
pub async fn update_records_handler(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    let query = RecordQuery::where_equals(&request.query);
    let modified = state
        .shelter
        .update(&query, &request.set, request.multiple)
        .await?;
    Ok(Json(json!({ "modified": modified })))
}

/// `DELETE /api/records`
pub async fn delete_records_handler(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    let query = RecordQuery::where_equals(&request.query);
    let deleted = state.shelter.delete(&query, request.multiple).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
