//! Playlist endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use muzo_common::models::{PlaylistCreate, PlaylistUpdate};
use muzo_common::Playlist;
use serde::Serialize;
use tracing::info;

use crate::db::playlists;
use crate::{coordinator, ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct PlaylistDeleted {
    pub message: String,
    /// Tracks that were in the playlist and are now unassigned
    pub unassigned_tracks: u64,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    /// Playlists whose stored count was wrong
    pub corrected: u64,
}

/// GET /api/playlists
pub async fn list_playlists(State(state): State<AppState>) -> ApiResult<Json<Vec<Playlist>>> {
    Ok(Json(playlists::list_playlists(&state.db).await?))
}

/// POST /api/playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    payload: Result<Json<PlaylistCreate>, JsonRejection>,
) -> ApiResult<Json<Playlist>> {
    let Json(input) = payload?;
    let playlist = Playlist::new(input)?;
    playlists::insert_playlist(&state.db, &playlist).await?;

    info!(playlist_id = %playlist.id, name = %playlist.name, "Playlist created");
    Ok(Json(playlist))
}

/// GET /api/playlists/:id
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Playlist>> {
    playlists::get_playlist(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Playlist {id}")))
}

/// PUT /api/playlists/:id
pub async fn update_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PlaylistUpdate>, JsonRejection>,
) -> ApiResult<Json<Playlist>> {
    let Json(update) = payload?;
    let playlist = playlists::update_playlist(&state.db, &id, &update).await?;
    Ok(Json(playlist))
}

/// DELETE /api/playlists/:id
pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlaylistDeleted>> {
    let unassigned_tracks = coordinator::delete_playlist(&state.db, &id).await?;
    Ok(Json(PlaylistDeleted {
        message: "Playlist deleted".to_string(),
        unassigned_tracks,
    }))
}

/// POST /api/playlists/reconcile
pub async fn reconcile(State(state): State<AppState>) -> ApiResult<Json<ReconcileResponse>> {
    let corrected = coordinator::reconcile_track_counts(&state.db).await?;
    Ok(Json(ReconcileResponse { corrected }))
}

pub fn playlist_routes() -> Router<AppState> {
    Router::new()
        .route("/api/playlists", get(list_playlists).post(create_playlist))
        .route("/api/playlists/reconcile", post(reconcile))
        .route(
            "/api/playlists/:id",
            get(get_playlist).put(update_playlist).delete(delete_playlist),
        )
}
