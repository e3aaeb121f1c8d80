use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{SearchPreferences, TrackMatch},
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<TrackMatch>,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Handler for catalog search
///
/// Accepts the structured preference record produced by an upstream mood
/// parser and returns the ranked shortlist. An empty result set is a normal
/// outcome, not an error.
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(prefs): Json<SearchPreferences>,
) -> AppResult<Json<SearchResponse>> {
    tracing::info!(
        request_id = %request_id,
        k = prefs.result_count(),
        has_bpm_range = prefs.bpm_range.is_some(),
        has_energy_range = prefs.energy_range.is_some(),
        mood_class = ?prefs.mood_class,
        "Processing search request"
    );

    let results = state.catalog.search(&prefs, &state.ranking);

    tracing::info!(
        request_id = %request_id,
        results = results.len(),
        "Search completed"
    );

    Ok(Json(SearchResponse { results }))
}
