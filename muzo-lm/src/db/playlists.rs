//! Playlist persistence
//!
//! `track_count` is only ever changed by SQL arithmetic on the stored value
//! (`track_count + 1`, floored `track_count - 1`) or recomputed from the
//! tracks table, never written from a value read earlier.

use super::{format_timestamp, parse_timestamp};
use muzo_common::models::PlaylistUpdate;
use muzo_common::{Error, Playlist, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

const PLAYLIST_COLUMNS: &str = "id, name, description, emoji, created_at, track_count";

fn playlist_from_row(row: &SqliteRow) -> Result<Playlist> {
    let created_at: String = row.get("created_at");

    Ok(Playlist {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        emoji: row.get("emoji"),
        created_at: parse_timestamp("created_at", &created_at)?,
        track_count: row.get("track_count"),
    })
}

/// Insert a new playlist row
pub async fn insert_playlist<'e, E>(executor: E, playlist: &Playlist) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO playlists (id, name, description, emoji, created_at, track_count)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&playlist.id)
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(&playlist.emoji)
    .bind(format_timestamp(&playlist.created_at))
    .bind(playlist.track_count)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_playlist<'e, E>(executor: E, id: &str) -> Result<Option<Playlist>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(playlist_from_row).transpose()
}

/// All playlists, newest first
pub async fn list_playlists<'e, E>(executor: E) -> Result<Vec<Playlist>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY created_at DESC, id ASC"
    ))
    .fetch_all(executor)
    .await?;

    rows.iter().map(playlist_from_row).collect()
}

/// Apply a metadata update. The count column is not part of the statement, so
/// concurrent membership changes are never overwritten.
pub async fn update_playlist(
    pool: &SqlitePool,
    id: &str,
    update: &PlaylistUpdate,
) -> Result<Playlist> {
    let mut playlist = get_playlist(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Playlist {id}")))?;
    update.apply(&mut playlist)?;

    let row = sqlx::query(&format!(
        r#"
        UPDATE playlists SET name = ?, description = ?, emoji = ?
        WHERE id = ?
        RETURNING {PLAYLIST_COLUMNS}
        "#
    ))
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(&playlist.emoji)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Playlist {id}")))?;

    playlist_from_row(&row)
}

/// Delete the playlist row. Tracks must already be unassigned.
pub async fn delete_playlist<'e, E>(executor: E, id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// `track_count + 1`. Returns false when the playlist does not exist.
pub async fn increment_track_count<'e, E>(executor: E, id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE playlists SET track_count = track_count + 1 WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// `track_count - 1`, floored at zero. Returns false when the playlist does not exist.
pub async fn decrement_track_count<'e, E>(executor: E, id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result =
        sqlx::query("UPDATE playlists SET track_count = MAX(track_count - 1, 0) WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

    Ok(result.rows_affected() == 1)
}

/// Recompute every count from the tracks table. Returns how many were wrong.
pub async fn recount_all<'e, E>(executor: E) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE playlists
        SET track_count = (SELECT COUNT(*) FROM tracks WHERE tracks.playlist_id = playlists.id)
        WHERE track_count != (SELECT COUNT(*) FROM tracks WHERE tracks.playlist_id = playlists.id)
        "#,
    )
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
