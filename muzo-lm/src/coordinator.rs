//! Playlist membership consistency
//!
//! `playlists.track_count` must always equal the number of tracks whose
//! `playlist_id` names that playlist. Every mutation that can change a track's
//! assignment runs here, inside one transaction that pairs the track write with
//! the count arithmetic:
//!
//! - Each transaction starts with a write, so SQLite takes the write lock before
//!   anything is read and concurrent writers queue on the busy timeout instead of
//!   working from a stale snapshot.
//! - Counts change by `+ 1` / floored `- 1` on the stored value, never by writing
//!   back a number read earlier.
//! - Updates read the track only after that first write, inside the same
//!   transaction, so nothing they write back can be stale.
//!
//! [`reconcile_track_counts`] recomputes all counts from the tracks table; it runs
//! at startup and on demand to repair anything written outside this module.

use crate::db::{playlists, tracks};
use muzo_common::models::{TrackCreate, TrackUpdate};
use muzo_common::{Error, Result, Track};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Create a track, counting it into its playlist if it has one.
///
/// Assigning to a playlist that does not exist is `NotFound` and nothing is stored.
pub async fn create_track(pool: &SqlitePool, input: TrackCreate) -> Result<Track> {
    let track = Track::new(input)?;

    let mut tx = pool.begin().await?;
    if let Some(playlist_id) = &track.playlist_id {
        if !playlists::increment_track_count(&mut *tx, playlist_id).await? {
            return Err(Error::NotFound(format!("Playlist {playlist_id}")));
        }
    }
    tracks::insert_track(&mut *tx, &track).await?;
    tx.commit().await?;

    info!(
        track_id = %track.id,
        key = %track.key,
        camelot_key = %track.camelot_key,
        playlist_id = ?track.playlist_id,
        "Track created"
    );
    Ok(track)
}

/// Apply a partial update, moving the track between playlists when the
/// update carries a `playlist_id`.
///
/// The row is locked before it is read, so concurrent updates of the same
/// track apply one after another and each sees the other's fields.
pub async fn update_track(pool: &SqlitePool, id: &str, update: &TrackUpdate) -> Result<Track> {
    let mut tx = pool.begin().await?;

    if !tracks::lock_track(&mut *tx, id).await? {
        return Err(Error::NotFound(format!("Track {id}")));
    }
    let current = tracks::get_track(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Track {id}")))?;

    let mut updated = current.clone();
    update.apply_fields(&mut updated)?;
    if let Some(playlist_id) = &update.playlist_id {
        updated.playlist_id = playlist_id.clone();
    }
    let moved = updated.playlist_id != current.playlist_id;

    if moved {
        if let Some(new_playlist) = &updated.playlist_id {
            if !playlists::increment_track_count(&mut *tx, new_playlist).await? {
                return Err(Error::NotFound(format!("Playlist {new_playlist}")));
            }
        }
    }

    tracks::replace_track(&mut *tx, &updated).await?;

    if moved {
        if let Some(old_playlist) = &current.playlist_id {
            playlists::decrement_track_count(&mut *tx, old_playlist).await?;
        }
    }

    tx.commit().await?;

    if moved {
        info!(
            track_id = %id,
            from = ?current.playlist_id,
            to = ?updated.playlist_id,
            "Track moved"
        );
    } else {
        debug!(track_id = %id, "Track updated");
    }
    Ok(updated)
}

/// Delete a track and count it out of its playlist.
pub async fn delete_track(pool: &SqlitePool, id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    let playlist_id = tracks::delete_track(&mut *tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Track {id}")))?;
    if let Some(playlist_id) = &playlist_id {
        playlists::decrement_track_count(&mut *tx, playlist_id).await?;
    }

    tx.commit().await?;

    info!(track_id = %id, playlist_id = ?playlist_id, "Track deleted");
    Ok(())
}

/// Delete a playlist. Its tracks stay in the library, unassigned.
///
/// Returns how many tracks were unassigned.
pub async fn delete_playlist(pool: &SqlitePool, id: &str) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let unassigned = tracks::unassign_playlist(&mut *tx, id).await?;
    if !playlists::delete_playlist(&mut *tx, id).await? {
        return Err(Error::NotFound(format!("Playlist {id}")));
    }

    tx.commit().await?;

    info!(playlist_id = %id, unassigned, "Playlist deleted");
    Ok(unassigned)
}

/// Recompute every playlist's count from the tracks table.
///
/// Returns how many counts were wrong (and are now fixed).
pub async fn reconcile_track_counts(pool: &SqlitePool) -> Result<u64> {
    let corrected = playlists::recount_all(pool).await?;

    if corrected > 0 {
        warn!(corrected, "Reconciled drifted playlist track counts");
    } else {
        debug!("Playlist track counts consistent");
    }
    Ok(corrected)
}
