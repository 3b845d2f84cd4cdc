//! Track endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use muzo_common::harmony::DEFAULT_SUGGESTION_LIMIT;
use muzo_common::models::{TrackCreate, TrackUpdate};
use muzo_common::Track;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::tracks::{self, TrackFilter};
use crate::suggest::{harmonic_suggestions, HarmonicSuggestion};
use crate::{coordinator, ApiError, ApiResult, AppState};

/// Upper bound on `?limit=` for suggestions
pub const MAX_SUGGESTION_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub limit: Option<usize>,
}

/// GET /api/tracks
pub async fn list_tracks(
    State(state): State<AppState>,
    filter: Result<Query<TrackFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Track>>> {
    let Query(filter) = filter?;
    let found = tracks::list_tracks(&state.db, &filter).await?;
    debug!(count = found.len(), "Listed tracks");
    Ok(Json(found))
}

/// POST /api/tracks
pub async fn create_track(
    State(state): State<AppState>,
    payload: Result<Json<TrackCreate>, JsonRejection>,
) -> ApiResult<Json<Track>> {
    let Json(input) = payload?;
    let track = coordinator::create_track(&state.db, input).await?;
    Ok(Json(track))
}

/// GET /api/tracks/:id
pub async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Track>> {
    tracks::get_track(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Track {id}")))
}

/// PUT /api/tracks/:id
pub async fn update_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TrackUpdate>, JsonRejection>,
) -> ApiResult<Json<Track>> {
    let Json(update) = payload?;
    let track = coordinator::update_track(&state.db, &id, &update).await?;
    Ok(Json(track))
}

/// DELETE /api/tracks/:id
pub async fn delete_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    coordinator::delete_track(&state.db, &id).await?;
    Ok(Json(MessageResponse {
        message: "Track deleted".to_string(),
    }))
}

/// GET /api/tracks/:id/harmonic-suggestions
pub async fn get_harmonic_suggestions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<SuggestionQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<HarmonicSuggestion>>> {
    let Query(query) = query?;
    let limit = match query.limit {
        None => DEFAULT_SUGGESTION_LIMIT,
        Some(0) => return Err(ApiError::BadRequest("limit must be at least 1".to_string())),
        Some(limit) => limit.min(MAX_SUGGESTION_LIMIT),
    };

    let suggestions = harmonic_suggestions(&state.db, &id, limit).await?;
    debug!(track_id = %id, count = suggestions.len(), "Ranked harmonic suggestions");
    Ok(Json(suggestions))
}

pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tracks", get(list_tracks).post(create_track))
        .route(
            "/api/tracks/:id",
            get(get_track).put(update_track).delete(delete_track),
        )
        .route(
            "/api/tracks/:id/harmonic-suggestions",
            get(get_harmonic_suggestions),
        )
}
