//! Library statistics

use muzo_common::harmony::{from_camelot, UNMAPPED};
use muzo_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCount {
    pub camelot_key: String,
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BpmStats {
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub avg_bpm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyCount {
    pub energy: i64,
    pub count: i64,
}

/// Response body of `GET /api/stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryStats {
    pub total_tracks: i64,
    pub total_playlists: i64,
    /// Tracks whose key could not be placed on the wheel
    pub unmapped_tracks: i64,
    /// Mapped codes only, most common first
    pub key_distribution: Vec<KeyCount>,
    /// `None` for an empty library
    pub bpm_stats: Option<BpmStats>,
    pub energy_distribution: Vec<EnergyCount>,
}

/// Gather library statistics from one consistent snapshot.
pub async fn library_stats(pool: &SqlitePool) -> Result<LibraryStats> {
    let mut tx = pool.begin().await?;

    let total_tracks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
        .fetch_one(&mut *tx)
        .await?;
    let total_playlists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM playlists")
        .fetch_one(&mut *tx)
        .await?;
    let unmapped_tracks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks WHERE camelot_key = ?")
        .bind(UNMAPPED)
        .fetch_one(&mut *tx)
        .await?;

    let key_distribution = sqlx::query(
        r#"
        SELECT camelot_key, COUNT(*) AS count
        FROM tracks
        WHERE camelot_key != ?
        GROUP BY camelot_key
        ORDER BY count DESC, camelot_key ASC
        "#,
    )
    .bind(UNMAPPED)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|row| {
        let camelot_key: String = row.get("camelot_key");
        KeyCount {
            key: from_camelot(&camelot_key).unwrap_or(UNMAPPED).to_string(),
            camelot_key,
            count: row.get("count"),
        }
    })
    .collect();

    let row = sqlx::query(
        "SELECT MIN(bpm) AS min_bpm, MAX(bpm) AS max_bpm, AVG(bpm) AS avg_bpm FROM tracks",
    )
    .fetch_one(&mut *tx)
    .await?;
    let bpm_stats = match (
        row.try_get::<Option<f64>, _>("min_bpm")?,
        row.try_get::<Option<f64>, _>("max_bpm")?,
        row.try_get::<Option<f64>, _>("avg_bpm")?,
    ) {
        (Some(min_bpm), Some(max_bpm), Some(avg_bpm)) => Some(BpmStats {
            min_bpm,
            max_bpm,
            avg_bpm,
        }),
        _ => None,
    };

    let energy_distribution = sqlx::query(
        "SELECT energy, COUNT(*) AS count FROM tracks GROUP BY energy ORDER BY energy ASC",
    )
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|row| EnergyCount {
        energy: row.get("energy"),
        count: row.get("count"),
    })
    .collect();

    tx.commit().await?;

    Ok(LibraryStats {
        total_tracks,
        total_playlists,
        unmapped_tracks,
        key_distribution,
        bpm_stats,
        energy_distribution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, tracks};
    use muzo_common::models::{AnalysisMethod, TrackCreate};
    use muzo_common::Track;

    async fn add(pool: &SqlitePool, key: &str, bpm: f64, energy: i64) {
        let track = Track::new(TrackCreate {
            filename: "f.mp3".to_string(),
            title: "t".to_string(),
            artist: String::new(),
            album: String::new(),
            key: key.to_string(),
            bpm,
            energy,
            duration: 0.0,
            playlist_id: None,
            analysis_method: AnalysisMethod::Manual,
        })
        .unwrap();
        tracks::insert_track(pool, &track).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_library() {
        let pool = connect_in_memory().await.unwrap();
        let stats = library_stats(&pool).await.unwrap();

        assert_eq!(stats.total_tracks, 0);
        assert_eq!(stats.bpm_stats, None);
        assert!(stats.key_distribution.is_empty());
        assert!(stats.energy_distribution.is_empty());
    }

    #[tokio::test]
    async fn test_distributions() {
        let pool = connect_in_memory().await.unwrap();
        add(&pool, "A minor", 120.0, 5).await;
        add(&pool, "Am", 130.0, 5).await;
        add(&pool, "C major", 125.0, 8).await;
        add(&pool, "Q flat wrong", 110.0, 3).await;

        let stats = library_stats(&pool).await.unwrap();
        assert_eq!(stats.total_tracks, 4);
        assert_eq!(stats.unmapped_tracks, 1);
        assert_eq!(
            stats.key_distribution,
            vec![
                KeyCount {
                    camelot_key: "8A".to_string(),
                    key: "A minor".to_string(),
                    count: 2
                },
                KeyCount {
                    camelot_key: "8B".to_string(),
                    key: "C major".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(
            stats.bpm_stats,
            Some(BpmStats {
                min_bpm: 110.0,
                max_bpm: 130.0,
                avg_bpm: 121.25
            })
        );
        let energies: Vec<(i64, i64)> = stats
            .energy_distribution
            .iter()
            .map(|e| (e.energy, e.count))
            .collect();
        assert_eq!(energies, vec![(3, 1), (5, 2), (8, 1)]);
    }
}
