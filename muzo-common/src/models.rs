//! Track and playlist models
//!
//! Everything that enters the library goes through the constructors here, so the
//! key/Camelot pairing and the energy clamp hold no matter where the data came from
//! (user input, client-side detection or the analysis service).

use crate::harmony::{resolve_key, HarmonicCandidate};
use crate::{Error, Result};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Lowest stored energy level
pub const MIN_ENERGY: i64 = 1;
/// Highest stored energy level
pub const MAX_ENERGY: i64 = 10;
/// Decorative tag given to playlists created without one
pub const DEFAULT_EMOJI: &str = "🎵";

/// Clamp an energy reading into [`MIN_ENERGY`, `MAX_ENERGY`]
pub fn clamp_energy(energy: i64) -> i64 {
    energy.clamp(MIN_ENERGY, MAX_ENERGY)
}

/// Current time at the precision timestamps are stored with (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Generate a new record id (UUIDv4 text)
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// How a track's key/tempo/energy were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMethod {
    #[default]
    Manual,
    Client,
    Ai,
}

impl AnalysisMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMethod::Manual => "manual",
            AnalysisMethod::Client => "client",
            AnalysisMethod::Ai => "ai",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(AnalysisMethod::Manual),
            "client" => Some(AnalysisMethod::Client),
            "ai" => Some(AnalysisMethod::Ai),
            _ => None,
        }
    }
}

/// A catalogued track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Canonical key name, or the raw spelling when it could not be normalized
    pub key: String,
    /// Camelot code derived from `key`, `?` when unmapped
    pub camelot_key: String,
    pub bpm: f64,
    pub energy: i64,
    /// Seconds
    pub duration: f64,
    pub date_added: DateTime<Utc>,
    pub playlist_id: Option<String>,
    pub analysis_method: AnalysisMethod,
}

impl Track {
    /// Build a new track from validated input. Normalizes the key, derives the
    /// Camelot code and clamps energy.
    pub fn new(input: TrackCreate) -> Result<Self> {
        validate_text("filename", &input.filename)?;
        validate_text("title", &input.title)?;
        validate_bpm(input.bpm)?;
        validate_duration(input.duration)?;

        let (key, camelot_key) = resolve_key(&input.key);

        Ok(Self {
            id: new_id(),
            filename: input.filename,
            title: input.title,
            artist: input.artist,
            album: input.album,
            key,
            camelot_key: camelot_key.to_string(),
            bpm: input.bpm,
            energy: clamp_energy(input.energy),
            duration: input.duration,
            date_added: now(),
            playlist_id: input.playlist_id,
            analysis_method: input.analysis_method,
        })
    }

    /// Replace the key, keeping the Camelot code in step
    pub fn set_key(&mut self, raw: &str) {
        let (key, camelot_key) = resolve_key(raw);
        self.key = key;
        self.camelot_key = camelot_key.to_string();
    }
}

impl HarmonicCandidate for Track {
    fn id(&self) -> &str {
        &self.id
    }

    fn camelot_key(&self) -> &str {
        &self.camelot_key
    }

    fn bpm(&self) -> f64 {
        self.bpm
    }
}

/// Track creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct TrackCreate {
    pub filename: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    pub key: String,
    pub bpm: f64,
    pub energy: i64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub playlist_id: Option<String>,
    #[serde(default)]
    pub analysis_method: AnalysisMethod,
}

/// Partial track update. Absent fields are left unchanged.
///
/// `playlist_id` is doubly optional: absent keeps the assignment, `null`
/// unassigns, a string reassigns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackUpdate {
    pub filename: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub key: Option<String>,
    pub bpm: Option<f64>,
    pub energy: Option<i64>,
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub playlist_id: Option<Option<String>>,
    pub analysis_method: Option<AnalysisMethod>,
}

fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl TrackUpdate {
    /// Validate and apply every field except the playlist assignment, which
    /// belongs to the consistency coordinator.
    pub fn apply_fields(&self, track: &mut Track) -> Result<()> {
        if let Some(filename) = &self.filename {
            validate_text("filename", filename)?;
        }
        if let Some(title) = &self.title {
            validate_text("title", title)?;
        }
        if let Some(bpm) = self.bpm {
            validate_bpm(bpm)?;
        }
        if let Some(duration) = self.duration {
            validate_duration(duration)?;
        }

        if let Some(filename) = &self.filename {
            track.filename = filename.clone();
        }
        if let Some(title) = &self.title {
            track.title = title.clone();
        }
        if let Some(artist) = &self.artist {
            track.artist = artist.clone();
        }
        if let Some(album) = &self.album {
            track.album = album.clone();
        }
        if let Some(key) = &self.key {
            track.set_key(key);
        }
        if let Some(bpm) = self.bpm {
            track.bpm = bpm;
        }
        if let Some(energy) = self.energy {
            track.energy = clamp_energy(energy);
        }
        if let Some(duration) = self.duration {
            track.duration = duration;
        }
        if let Some(method) = self.analysis_method {
            track.analysis_method = method;
        }

        Ok(())
    }
}

/// A named group of tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
    /// Maintained aggregate: number of tracks whose `playlist_id` is this playlist
    pub track_count: i64,
}

impl Playlist {
    /// New, empty playlist
    pub fn new(input: PlaylistCreate) -> Result<Self> {
        validate_text("name", &input.name)?;

        Ok(Self {
            id: new_id(),
            name: input.name,
            description: input.description,
            emoji: input.emoji.unwrap_or_else(|| DEFAULT_EMOJI.to_string()),
            created_at: now(),
            track_count: 0,
        })
    }
}

/// Playlist creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

/// Playlist metadata update. Never touches `track_count`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub emoji: Option<String>,
}

impl PlaylistUpdate {
    pub fn apply(&self, playlist: &mut Playlist) -> Result<()> {
        if let Some(name) = &self.name {
            validate_text("name", name)?;
            playlist.name = name.clone();
        }
        if let Some(description) = &self.description {
            playlist.description = description.clone();
        }
        if let Some(emoji) = &self.emoji {
            playlist.emoji = emoji.clone();
        }
        Ok(())
    }
}

fn validate_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Tempo must be a positive, finite BPM
pub fn validate_bpm(bpm: f64) -> Result<()> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "bpm must be a positive number, got {bpm}"
        )));
    }
    Ok(())
}

fn validate_duration(duration: f64) -> Result<()> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(Error::InvalidInput(format!(
            "duration must be zero or more seconds, got {duration}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(key: &str, energy: i64) -> TrackCreate {
        TrackCreate {
            filename: "deadmau5_strobe.mp3".to_string(),
            title: "Strobe".to_string(),
            artist: "deadmau5".to_string(),
            album: "For Lack of a Better Name".to_string(),
            key: key.to_string(),
            bpm: 128.0,
            energy,
            duration: 645.2,
            playlist_id: None,
            analysis_method: AnalysisMethod::Manual,
        }
    }

    #[test]
    fn test_new_track_normalizes_and_encodes() {
        let track = Track::new(create("F# minor", 8)).unwrap();
        assert_eq!(track.key, "Gb minor");
        assert_eq!(track.camelot_key, "11A");
        assert_eq!(track.energy, 8);
        assert!(uuid::Uuid::parse_str(&track.id).is_ok());
    }

    #[test]
    fn test_energy_clamped() {
        assert_eq!(Track::new(create("A minor", 0)).unwrap().energy, 1);
        assert_eq!(Track::new(create("A minor", 11)).unwrap().energy, 10);
        assert_eq!(Track::new(create("A minor", -3)).unwrap().energy, 1);
    }

    #[test]
    fn test_unmapped_key_kept_with_sentinel() {
        let track = Track::new(create("Q flat wrong", 5)).unwrap();
        assert_eq!(track.key, "Q flat wrong");
        assert_eq!(track.camelot_key, "?");
    }

    #[test]
    fn test_invalid_input_rejected() {
        let mut bad = create("A minor", 5);
        bad.bpm = 0.0;
        assert!(matches!(Track::new(bad), Err(Error::InvalidInput(_))));

        let mut bad = create("A minor", 5);
        bad.bpm = f64::NAN;
        assert!(matches!(Track::new(bad), Err(Error::InvalidInput(_))));

        let mut bad = create("A minor", 5);
        bad.title = "   ".to_string();
        assert!(matches!(Track::new(bad), Err(Error::InvalidInput(_))));

        let mut bad = create("A minor", 5);
        bad.duration = -1.0;
        assert!(matches!(Track::new(bad), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_update_keeps_camelot_in_step() {
        let mut track = Track::new(create("A minor", 5)).unwrap();
        let update = TrackUpdate {
            title: Some("Strobe (Extended Mix)".to_string()),
            key: Some("Gb minor".to_string()),
            energy: Some(42),
            ..Default::default()
        };
        update.apply_fields(&mut track).unwrap();

        assert_eq!(track.title, "Strobe (Extended Mix)");
        assert_eq!(track.camelot_key, "11A");
        assert_eq!(track.energy, 10);
    }

    #[test]
    fn test_update_validation_is_all_or_nothing() {
        let mut track = Track::new(create("A minor", 5)).unwrap();
        let before = track.clone();
        let update = TrackUpdate {
            title: Some("New".to_string()),
            bpm: Some(-10.0),
            ..Default::default()
        };
        assert!(update.apply_fields(&mut track).is_err());
        assert_eq!(track, before);
    }

    #[test]
    fn test_update_playlist_field_tristate() {
        let absent: TrackUpdate = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(absent.playlist_id, None);

        let cleared: TrackUpdate = serde_json::from_str(r#"{"playlist_id": null}"#).unwrap();
        assert_eq!(cleared.playlist_id, Some(None));

        let set: TrackUpdate = serde_json::from_str(r#"{"playlist_id": "p1"}"#).unwrap();
        assert_eq!(set.playlist_id, Some(Some("p1".to_string())));
    }

    #[test]
    fn test_create_payload_defaults() {
        let input: TrackCreate = serde_json::from_str(
            r#"{"filename": "a.mp3", "title": "A", "key": "Am", "bpm": 120.5, "energy": 6}"#,
        )
        .unwrap();
        assert_eq!(input.artist, "");
        assert_eq!(input.duration, 0.0);
        assert_eq!(input.playlist_id, None);
        assert_eq!(input.analysis_method, AnalysisMethod::Manual);
    }

    #[test]
    fn test_analysis_method_round_trip() {
        for method in [AnalysisMethod::Manual, AnalysisMethod::Client, AnalysisMethod::Ai] {
            assert_eq!(AnalysisMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(AnalysisMethod::parse("guess"), None);
    }

    #[test]
    fn test_playlist_defaults() {
        let playlist = Playlist::new(PlaylistCreate {
            name: "Peak Time Bangers".to_string(),
            description: String::new(),
            emoji: None,
        })
        .unwrap();
        assert_eq!(playlist.track_count, 0);
        assert_eq!(playlist.emoji, DEFAULT_EMOJI);
    }

    #[test]
    fn test_playlist_update_rejects_empty_name() {
        let mut playlist = Playlist::new(PlaylistCreate {
            name: "Mix".to_string(),
            description: String::new(),
            emoji: Some("🌙".to_string()),
        })
        .unwrap();
        let update = PlaylistUpdate {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(update.apply(&mut playlist).is_err());
        assert_eq!(playlist.name, "Mix");
    }
}
