//! Database access for muzo-lm
//!
//! One SQLite file (`<root>/muzo.db`) holds the library. Connections run in WAL
//! mode with foreign keys on and a busy timeout, so concurrent writers queue
//! instead of failing.

pub mod playlists;
pub mod tracks;

use chrono::{DateTime, SecondsFormat, Utc};
use muzo_common::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// How long a connection waits on a locked database before giving up
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

const MAX_CONNECTIONS: u32 = 10;

/// Open (or create) the library database and make sure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    // More than one connection would mean more than one database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            emoji TEXT NOT NULL,
            created_at TEXT NOT NULL,
            track_count INTEGER NOT NULL DEFAULT 0 CHECK (track_count >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            title TEXT NOT NULL,
            artist TEXT NOT NULL DEFAULT '',
            album TEXT NOT NULL DEFAULT '',
            "key" TEXT NOT NULL,
            camelot_key TEXT NOT NULL,
            bpm REAL NOT NULL CHECK (bpm > 0),
            energy INTEGER NOT NULL CHECK (energy BETWEEN 1 AND 10),
            duration REAL NOT NULL DEFAULT 0,
            date_added TEXT NOT NULL,
            playlist_id TEXT REFERENCES playlists(id),
            analysis_method TEXT NOT NULL DEFAULT 'manual'
        )
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_tracks_playlist ON tracks(playlist_id)",
        "CREATE INDEX IF NOT EXISTS idx_tracks_camelot ON tracks(camelot_key)",
        "CREATE INDEX IF NOT EXISTS idx_tracks_date_added ON tracks(date_added)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

/// Stored timestamp form: RFC 3339, UTC, microseconds. Sorts lexically.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Bad {column} timestamp '{value}': {e}")))
}
