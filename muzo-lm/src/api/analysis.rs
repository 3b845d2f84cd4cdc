//! Audio analysis endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};

use crate::analysis::{analyze, AnalysisRequest, AnalysisResult};
use crate::{ApiResult, AppState};

/// POST /api/analyze-ai
///
/// Runs the configured analyzer. An analyzer failure is a 503, never a guess.
pub async fn analyze_ai(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisResult>> {
    let Json(request) = payload?;
    let result = analyze(state.analyzer.as_ref(), &request).await?;
    Ok(Json(result))
}

pub fn analysis_routes() -> Router<AppState> {
    Router::new().route("/api/analyze-ai", post(analyze_ai))
}
