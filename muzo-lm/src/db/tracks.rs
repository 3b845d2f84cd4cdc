//! Track persistence
//!
//! Plain row operations. Anything that moves a track between playlists goes
//! through [`crate::coordinator`], which wraps these calls in a transaction
//! together with the playlist count updates.

use super::{format_timestamp, parse_timestamp};
use muzo_common::harmony::normalize;
use muzo_common::models::AnalysisMethod;
use muzo_common::{Error, Result, Track};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, QueryBuilder, Row, Sqlite};

/// Largest page `list_tracks` returns, also the default page size
pub const MAX_PAGE_SIZE: i64 = 1000;

const TRACK_COLUMNS: &str = r#"id, filename, title, artist, album, "key", camelot_key, bpm,
    energy, duration, date_added, playlist_id, analysis_method"#;

/// Column a track listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    DateAdded,
    Title,
    Artist,
    Album,
    Key,
    CamelotKey,
    Bpm,
    Energy,
    Duration,
}

impl SortField {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "date_added" => SortField::DateAdded,
            "title" => SortField::Title,
            "artist" => SortField::Artist,
            "album" => SortField::Album,
            "key" => SortField::Key,
            "camelot_key" => SortField::CamelotKey,
            "bpm" => SortField::Bpm,
            "energy" => SortField::Energy,
            "duration" => SortField::Duration,
            other => {
                return Err(Error::InvalidInput(format!("Unknown sort field '{other}'")));
            }
        })
    }

    fn column(self) -> &'static str {
        match self {
            SortField::DateAdded => "date_added",
            SortField::Title => "title",
            SortField::Artist => "artist",
            SortField::Album => "album",
            SortField::Key => "\"key\"",
            SortField::CamelotKey => "camelot_key",
            SortField::Bpm => "bpm",
            SortField::Energy => "energy",
            SortField::Duration => "duration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidInput(format!(
                "Unknown sort order '{other}' (expected 'asc' or 'desc')"
            ))),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Listing filters, all optional and combined with AND.
///
/// Deserializes straight from the `GET /api/tracks` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackFilter {
    pub playlist_id: Option<String>,
    /// Any spelling; normalized before matching
    pub key: Option<String>,
    pub camelot_key: Option<String>,
    pub min_bpm: Option<f64>,
    pub max_bpm: Option<f64>,
    pub min_energy: Option<i64>,
    pub max_energy: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TrackFilter {
    /// Resolved ordering. Defaults to newest first.
    pub fn ordering(&self) -> Result<(SortField, SortOrder)> {
        let field = match &self.sort_by {
            Some(value) => SortField::parse(value)?,
            None => SortField::DateAdded,
        };
        let order = match &self.order {
            Some(value) => SortOrder::parse(value)?,
            None => SortOrder::Desc,
        };
        Ok((field, order))
    }

    /// Resolved `(limit, offset)`
    pub fn page(&self) -> Result<(i64, i64)> {
        let limit = self.limit.unwrap_or(MAX_PAGE_SIZE);
        if limit < 1 {
            return Err(Error::InvalidInput(format!("limit must be at least 1, got {limit}")));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(Error::InvalidInput(format!("offset must not be negative, got {offset}")));
        }
        Ok((limit.min(MAX_PAGE_SIZE), offset))
    }
}

fn track_from_row(row: &SqliteRow) -> Result<Track> {
    let date_added: String = row.get("date_added");
    let method: String = row.get("analysis_method");

    Ok(Track {
        id: row.get("id"),
        filename: row.get("filename"),
        title: row.get("title"),
        artist: row.get("artist"),
        album: row.get("album"),
        key: row.get("key"),
        camelot_key: row.get("camelot_key"),
        bpm: row.get("bpm"),
        energy: row.get("energy"),
        duration: row.get("duration"),
        date_added: parse_timestamp("date_added", &date_added)?,
        playlist_id: row.get("playlist_id"),
        analysis_method: AnalysisMethod::parse(&method)
            .ok_or_else(|| Error::Internal(format!("Unknown analysis method '{method}'")))?,
    })
}

/// Insert a new track row
pub async fn insert_track<'e, E>(executor: E, track: &Track) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO tracks (
            id, filename, title, artist, album, "key", camelot_key, bpm,
            energy, duration, date_added, playlist_id, analysis_method
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&track.id)
    .bind(&track.filename)
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.album)
    .bind(&track.key)
    .bind(&track.camelot_key)
    .bind(track.bpm)
    .bind(track.energy)
    .bind(track.duration)
    .bind(format_timestamp(&track.date_added))
    .bind(&track.playlist_id)
    .bind(track.analysis_method.as_str())
    .execute(executor)
    .await?;

    Ok(())
}

/// Load one track by id
pub async fn get_track<'e, E>(executor: E, id: &str) -> Result<Option<Track>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(track_from_row).transpose()
}

/// Filtered, ordered, paged listing. Ties on the sort column fall back to id.
pub async fn list_tracks<'e, E>(executor: E, filter: &TrackFilter) -> Result<Vec<Track>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (field, order) = filter.ordering()?;
    let (limit, offset) = filter.page()?;

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {TRACK_COLUMNS} FROM tracks WHERE 1 = 1"
    ));

    if let Some(playlist_id) = &filter.playlist_id {
        query.push(" AND playlist_id = ").push_bind(playlist_id.clone());
    }
    if let Some(key) = &filter.key {
        query.push(" AND \"key\" = ").push_bind(normalize(key));
    }
    if let Some(code) = &filter.camelot_key {
        query.push(" AND camelot_key = ").push_bind(code.trim().to_ascii_uppercase());
    }
    if let Some(min_bpm) = filter.min_bpm {
        query.push(" AND bpm >= ").push_bind(min_bpm);
    }
    if let Some(max_bpm) = filter.max_bpm {
        query.push(" AND bpm <= ").push_bind(max_bpm);
    }
    if let Some(min_energy) = filter.min_energy {
        query.push(" AND energy >= ").push_bind(min_energy);
    }
    if let Some(max_energy) = filter.max_energy {
        query.push(" AND energy <= ").push_bind(max_energy);
    }

    query.push(format!(
        " ORDER BY {} {}, id ASC LIMIT ",
        field.column(),
        order.sql()
    ));
    query.push_bind(limit);
    query.push(" OFFSET ").push_bind(offset);

    let rows = query.build().fetch_all(executor).await?;
    rows.iter().map(track_from_row).collect()
}

/// Every track whose Camelot code is one of `codes`
pub async fn find_by_camelot_codes<'e, E>(executor: E, codes: &[String]) -> Result<Vec<Track>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {TRACK_COLUMNS} FROM tracks WHERE camelot_key IN ("
    ));
    let mut separated = query.separated(", ");
    for code in codes {
        separated.push_bind(code.clone());
    }
    separated.push_unseparated(")");

    let rows = query.build().fetch_all(executor).await?;
    rows.iter().map(track_from_row).collect()
}

/// Overwrite every column of `track`, but only while its stored assignment is
/// still `expected_playlist`. Returns false when the row is gone or was moved.
/// Take the write lock on a track's row with a no-op write.
///
/// Returns `false` if no such track.
pub async fn lock_track<'e, E>(executor: E, id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE tracks SET id = id WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn replace_track<'e, E>(executor: E, track: &Track) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE tracks SET
            filename = ?, title = ?, artist = ?, album = ?, "key" = ?, camelot_key = ?,
            bpm = ?, energy = ?, duration = ?, playlist_id = ?, analysis_method = ?
        WHERE id = ?
        "#,
    )
    .bind(&track.filename)
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.album)
    .bind(&track.key)
    .bind(&track.camelot_key)
    .bind(track.bpm)
    .bind(track.energy)
    .bind(track.duration)
    .bind(&track.playlist_id)
    .bind(track.analysis_method.as_str())
    .bind(&track.id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Delete a track.
///
/// Returns `None` if no such track, otherwise the playlist it was assigned to.
pub async fn delete_track<'e, E>(executor: E, id: &str) -> Result<Option<Option<String>>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("DELETE FROM tracks WHERE id = ? RETURNING playlist_id")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(|row| row.get("playlist_id")))
}

/// Unassign every track in a playlist. Returns how many were moved out.
pub async fn unassign_playlist<'e, E>(executor: E, playlist_id: &str) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE tracks SET playlist_id = NULL WHERE playlist_id = ?")
        .bind(playlist_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
