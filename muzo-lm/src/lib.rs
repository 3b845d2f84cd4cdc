//! muzo-lm library interface
//!
//! The Library Manager catalogues tracks with their musical key, tempo and
//! energy, groups them into playlists, and suggests harmonically compatible
//! next tracks. Exposed as a library so the integration tests can drive the
//! router and the coordinator directly.

pub mod analysis;
pub mod api;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod settings;
pub mod stats;
pub mod suggest;

pub use crate::error::{ApiError, ApiResult};

use analysis::Analyzer;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Library database pool
    pub db: SqlitePool,
    /// Answers `/api/analyze-ai`
    pub analyzer: Arc<dyn Analyzer>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            db,
            analyzer,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::info_routes())
        .merge(api::track_routes())
        .merge(api::playlist_routes())
        .merge(api::analysis_routes())
        .merge(api::stats_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
