//! Harmonic suggestions for a stored track

use crate::db::tracks;
use muzo_common::harmony::{harmonic_neighbors, rank};
use muzo_common::{Compatibility, Error, Result, Track};
use serde::Serialize;
use sqlx::SqlitePool;

/// An owned ranking entry, ready to serialize
#[derive(Debug, Clone, Serialize)]
pub struct HarmonicSuggestion {
    pub track: Track,
    pub compatibility: Compatibility,
    pub reason: String,
}

/// Rank the library against track `id`.
///
/// Only tracks whose code is a wheel neighbor of the source are loaded; the
/// ranker then classifies and orders them. An unmapped source has no neighbors
/// and gets an empty list.
pub async fn harmonic_suggestions(
    pool: &SqlitePool,
    id: &str,
    limit: usize,
) -> Result<Vec<HarmonicSuggestion>> {
    let source = tracks::get_track(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Track {id}")))?;

    let codes: Vec<String> = harmonic_neighbors(&source.camelot_key)
        .iter()
        .map(ToString::to_string)
        .collect();
    let candidates = tracks::find_by_camelot_codes(pool, &codes).await?;

    Ok(rank(&source, &candidates, limit)
        .into_iter()
        .map(|suggestion| HarmonicSuggestion {
            track: suggestion.track.clone(),
            compatibility: suggestion.compatibility,
            reason: suggestion.reason.to_string(),
        })
        .collect())
}
