//! Library statistics endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::stats::{library_stats, LibraryStats};
use crate::{ApiResult, AppState};

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<LibraryStats>> {
    Ok(Json(library_stats(&state.db).await?))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/api/stats", get(get_stats))
}
