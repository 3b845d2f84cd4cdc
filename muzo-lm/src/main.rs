//! muzo-lm - Muzo Library Manager
//!
//! Serves the track library over HTTP: tracks with key, tempo and energy,
//! playlists with maintained track counts, harmonic mixing suggestions,
//! library statistics and audio analysis.

use anyhow::{Context, Result};
use clap::Parser;
use muzo_common::config::prepare_root_folder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use muzo_lm::settings::{Args, Settings};
use muzo_lm::{analysis, build_router, coordinator, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The TOML file decides the default log level, so it is read before
    // tracing starts and reported right after
    let (settings, config_source) = Settings::load(args);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Build identification first, before any database delay
    info!(
        "Starting Muzo Library Manager (muzo-lm) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();
    config_source.seed_if_missing();

    let db_path = prepare_root_folder(&settings.root_folder).with_context(|| {
        format!(
            "Failed to initialize root folder {}",
            settings.root_folder.display()
        )
    })?;
    info!("Database: {}", db_path.display());

    let pool = db::init_database(&db_path)
        .await
        .context("Failed to open library database")?;

    // Repair any count drift left by an earlier crash or external edit
    coordinator::reconcile_track_counts(&pool)
        .await
        .context("Startup count reconciliation failed")?;

    let analyzer = analysis::build_analyzer(&settings.analysis)?;
    info!("Analysis provider: {}", analyzer.name());

    let state = AppState::new(pool, analyzer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind))?;
    info!("Listening on http://{}", settings.bind);
    info!("Health check: http://{}/health", settings.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("muzo-lm stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
