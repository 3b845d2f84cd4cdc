//! Concurrent mutations against a file-backed database
//!
//! Many tasks create, move and delete tracks at once through a shared pool.
//! Afterwards every playlist's stored count must equal the number of tracks
//! actually assigned to it.

use muzo_common::models::{AnalysisMethod, PlaylistCreate, TrackCreate, TrackUpdate};
use muzo_common::{Error, Playlist};
use muzo_lm::coordinator::{
    create_track, delete_playlist, delete_track, reconcile_track_counts, update_track,
};
use muzo_lm::db::{init_database, playlists, tracks};
use muzo_lm::stats::library_stats;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinSet;

async fn setup() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("muzo.db")).await.unwrap();
    (temp_dir, pool)
}

async fn new_playlist(pool: &SqlitePool, name: &str) -> Playlist {
    let playlist = Playlist::new(PlaylistCreate {
        name: name.to_string(),
        description: String::new(),
        emoji: None,
    })
    .unwrap();
    playlists::insert_playlist(pool, &playlist).await.unwrap();
    playlist
}

fn track_input(i: usize, playlist_id: Option<String>) -> TrackCreate {
    TrackCreate {
        filename: format!("track_{i}.mp3"),
        title: format!("Track {i}"),
        artist: String::new(),
        album: String::new(),
        key: "A minor".to_string(),
        bpm: 120.0 + i as f64,
        energy: 5,
        duration: 200.0,
        playlist_id,
        analysis_method: AnalysisMethod::Client,
    }
}

async fn drifted_playlists(pool: &SqlitePool) -> Vec<(String, i64, i64)> {
    sqlx::query_as(
        r#"
        SELECT id, track_count, actual FROM (
            SELECT p.id, p.track_count,
                   (SELECT COUNT(*) FROM tracks t WHERE t.playlist_id = p.id) AS actual
            FROM playlists p
        )
        WHERE track_count != actual
        "#,
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_concurrent_creates_into_one_playlist() {
    let (_dir, pool) = setup().await;
    let p = new_playlist(&pool, "Crowded").await;

    let mut join_set = JoinSet::new();
    for i in 0..40 {
        let pool = pool.clone();
        let playlist_id = p.id.clone();
        join_set.spawn(async move { create_track(&pool, track_input(i, Some(playlist_id))).await });
    }
    while let Some(result) = join_set.join_next().await {
        result.expect("Task panicked").expect("Create failed");
    }

    let stored = playlists::get_playlist(&pool, &p.id).await.unwrap().unwrap();
    assert_eq!(stored.track_count, 40);
    assert!(drifted_playlists(&pool).await.is_empty());
}

#[tokio::test]
async fn test_concurrent_mixed_mutations_keep_counts_exact() {
    let (_dir, pool) = setup().await;
    let mut playlist_ids = Vec::new();
    for name in ["A", "B", "C", "D"] {
        playlist_ids.push(new_playlist(&pool, name).await.id);
    }
    let playlist_ids = Arc::new(playlist_ids);

    // Seed tracks spread over the playlists
    let mut track_ids = Vec::new();
    for i in 0..24 {
        let playlist_id = Some(playlist_ids[i % playlist_ids.len()].clone());
        track_ids.push(create_track(&pool, track_input(i, playlist_id)).await.unwrap().id);
    }

    let mut join_set = JoinSet::new();
    for (i, track_id) in track_ids.iter().enumerate() {
        let pool = pool.clone();
        let playlist_ids = Arc::clone(&playlist_ids);
        let track_id = track_id.clone();
        join_set.spawn(async move {
            match i % 4 {
                // Move twice to different playlists
                0 | 1 => {
                    for hop in 1..=2 {
                        let target = playlist_ids[(i + hop) % playlist_ids.len()].clone();
                        let update = TrackUpdate {
                            playlist_id: Some(Some(target)),
                            ..Default::default()
                        };
                        update_track(&pool, &track_id, &update).await?;
                    }
                    Ok::<(), Error>(())
                }
                // Unassign, contended by the movers below for track 2
                2 => {
                    let update = TrackUpdate {
                        playlist_id: Some(None),
                        ..Default::default()
                    };
                    update_track(&pool, &track_id, &update).await.map(|_| ())
                }
                // Delete, then add a replacement somewhere else
                _ => {
                    delete_track(&pool, &track_id).await?;
                    let target = playlist_ids[i % playlist_ids.len()].clone();
                    create_track(&pool, track_input(100 + i, Some(target)))
                        .await
                        .map(|_| ())
                }
            }
        });
    }

    // Concurrent moves of the same track from two tasks
    for _ in 0..2 {
        let pool = pool.clone();
        let playlist_ids = Arc::clone(&playlist_ids);
        let track_id = track_ids[2].clone();
        join_set.spawn(async move {
            let update = TrackUpdate {
                playlist_id: Some(Some(playlist_ids[0].clone())),
                ..Default::default()
            };
            update_track(&pool, &track_id, &update).await.map(|_| ())
        });
    }

    while let Some(result) = join_set.join_next().await {
        result.expect("Task panicked").expect("Mutation failed");
    }

    assert!(
        drifted_playlists(&pool).await.is_empty(),
        "stored counts diverged from assignments"
    );
    assert_eq!(reconcile_track_counts(&pool).await.unwrap(), 0);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 24);
}

#[tokio::test]
async fn test_concurrent_field_updates_both_land() {
    let (_dir, pool) = setup().await;
    let p = new_playlist(&pool, "Edits").await;
    let q = new_playlist(&pool, "Other").await;

    for round in 0..50 {
        let track = create_track(&pool, track_input(round, Some(p.id.clone())))
            .await
            .unwrap();

        let updates = [
            TrackUpdate {
                title: Some("new title".to_string()),
                ..Default::default()
            },
            TrackUpdate {
                key: Some("C major".to_string()),
                ..Default::default()
            },
            TrackUpdate {
                playlist_id: Some(Some(q.id.clone())),
                ..Default::default()
            },
        ];

        let mut join_set = JoinSet::new();
        for update in updates {
            let pool = pool.clone();
            let track_id = track.id.clone();
            join_set.spawn(async move { update_track(&pool, &track_id, &update).await });
        }
        while let Some(result) = join_set.join_next().await {
            result.expect("Task panicked").expect("Update failed");
        }

        let stored = tracks::get_track(&pool, &track.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "new title", "round {round}: title lost");
        assert_eq!(stored.key, "C major", "round {round}: key lost");
        assert_eq!(stored.camelot_key, "8B");
        assert_eq!(stored.playlist_id.as_deref(), Some(q.id.as_str()));
    }

    assert_eq!(
        playlists::get_playlist(&pool, &q.id).await.unwrap().unwrap().track_count,
        50
    );
    assert!(drifted_playlists(&pool).await.is_empty());
}

#[tokio::test]
async fn test_playlist_delete_racing_assignments() {
    let (_dir, pool) = setup().await;
    let doomed = new_playlist(&pool, "Doomed").await;
    let safe = new_playlist(&pool, "Safe").await;

    let mut join_set = JoinSet::new();
    for i in 0..20 {
        let pool = pool.clone();
        let target = if i % 2 == 0 { doomed.id.clone() } else { safe.id.clone() };
        join_set.spawn(async move {
            // Creating into the doomed playlist may lose the race with its deletion
            match create_track(&pool, track_input(i, Some(target))).await {
                Ok(_) | Err(Error::NotFound(_)) => Ok(()),
                Err(e) => Err(e),
            }
        });
    }
    {
        let pool = pool.clone();
        let doomed_id = doomed.id.clone();
        join_set.spawn(async move { delete_playlist(&pool, &doomed_id).await.map(|_| ()) });
    }

    while let Some(result) = join_set.join_next().await {
        result.expect("Task panicked").expect("Mutation failed");
    }

    let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks WHERE playlist_id = ?")
        .bind(&doomed.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphaned, 0);
    assert_eq!(
        playlists::get_playlist(&pool, &safe.id).await.unwrap().unwrap().track_count,
        10
    );
    assert!(drifted_playlists(&pool).await.is_empty());
}

#[tokio::test]
async fn test_stats_consistent_while_library_churns() {
    let (_dir, pool) = setup().await;

    let churn = {
        let pool = pool.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                let track = create_track(&pool, track_input(i, None)).await?;
                delete_track(&pool, &track.id).await?;
            }
            Ok::<(), Error>(())
        })
    };

    while !churn.is_finished() {
        let stats = library_stats(&pool).await.unwrap();
        let keyed: i64 = stats.key_distribution.iter().map(|k| k.count).sum();
        let energised: i64 = stats.energy_distribution.iter().map(|e| e.count).sum();

        assert_eq!(stats.bpm_stats.is_some(), stats.total_tracks > 0);
        assert_eq!(keyed + stats.unmapped_tracks, stats.total_tracks);
        assert_eq!(energised, stats.total_tracks);
    }
    churn.await.expect("Task panicked").expect("Churn failed");

    let stats = library_stats(&pool).await.unwrap();
    assert_eq!(stats.total_tracks, 0);
    assert_eq!(stats.bpm_stats, None);
}

#[tokio::test]
async fn test_reconcile_after_corruption() {
    let (_dir, pool) = setup().await;
    let p = new_playlist(&pool, "Mix").await;
    for i in 0..5 {
        create_track(&pool, track_input(i, Some(p.id.clone()))).await.unwrap();
    }

    sqlx::query("UPDATE playlists SET track_count = 0")
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(drifted_playlists(&pool).await.len(), 1);

    assert_eq!(reconcile_track_counts(&pool).await.unwrap(), 1);
    assert!(drifted_playlists(&pool).await.is_empty());
}
