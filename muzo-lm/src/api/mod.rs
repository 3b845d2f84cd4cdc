//! HTTP API handlers

pub mod analysis;
pub mod health;
pub mod info;
pub mod playlists;
pub mod stats;
pub mod tracks;

pub use analysis::analysis_routes;
pub use health::health_routes;
pub use info::info_routes;
pub use playlists::playlist_routes;
pub use stats::stats_routes;
pub use tracks::track_routes;
