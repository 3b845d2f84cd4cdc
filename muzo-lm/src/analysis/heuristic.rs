//! Local key/tempo/energy estimate from submitted audio features

use super::{AnalysisRequest, Analyzer, RawAnalysis};
use async_trait::async_trait;
use muzo_common::harmony::{key_for_pitch_class, Mode};
use muzo_common::{Error, Result};

/// Semitone offsets of the natural minor scale
const MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
/// Semitone offsets of the major scale
const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Estimates from the features alone, no network
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

/// Pitch class (0 = C) of a frequency, via the MIDI note number
pub fn pitch_class(frequency: f64) -> u8 {
    let midi = (12.0 * (frequency / 440.0).log2()).round() as i64 + 69;
    midi.rem_euclid(12) as u8
}

/// Tonic from the dominant peak; minor if a minor third above it is present,
/// else major if a major third is, else minor.
fn estimate_key(peaks: &[f64]) -> Option<(u8, Mode, f64)> {
    let classes: Vec<u8> = peaks.iter().map(|&f| pitch_class(f)).collect();
    let tonic = *classes.first()?;

    let has = |offset: u8| classes.contains(&((tonic + offset) % 12));
    let mode = if has(3) {
        Mode::Minor
    } else if has(4) {
        Mode::Major
    } else {
        Mode::Minor
    };

    let scale = match mode {
        Mode::Minor => &MINOR_SCALE,
        Mode::Major => &MAJOR_SCALE,
    };
    let in_scale = classes
        .iter()
        .filter(|&&pc| scale.contains(&((pc + 12 - tonic) % 12)))
        .count();
    let confidence = in_scale as f64 / classes.len() as f64;

    Some((tonic, mode, confidence))
}

fn estimate_bpm(intervals: &[f64]) -> Option<f64> {
    if intervals.is_empty() {
        return None;
    }
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    Some(60_000.0 / mean)
}

#[async_trait]
impl Analyzer for HeuristicAnalyzer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<RawAnalysis> {
        let features = &request.audio_features;

        let peaks: Vec<f64> = features
            .frequency_peaks
            .iter()
            .copied()
            .filter(|f| f.is_finite() && *f > 0.0)
            .collect();
        let (tonic, mode, confidence) = estimate_key(&peaks)
            .ok_or_else(|| Error::Analysis("No usable frequency peaks".to_string()))?;

        let intervals: Vec<f64> = features
            .beat_intervals
            .iter()
            .copied()
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .collect();
        let bpm = estimate_bpm(&intervals)
            .ok_or_else(|| Error::Analysis("No usable beat intervals".to_string()))?;

        Ok(RawAnalysis {
            key: key_for_pitch_class(tonic, mode).to_string(),
            bpm,
            energy: (features.avg_amplitude * 10.0).round(),
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AudioFeatures;

    fn request(peaks: Vec<f64>, intervals: Vec<f64>, avg_amplitude: f64) -> AnalysisRequest {
        AnalysisRequest {
            filename: "clip.wav".to_string(),
            audio_features: AudioFeatures {
                frequency_peaks: peaks,
                beat_intervals: intervals,
                avg_amplitude,
                peak_amplitude: 0.9,
                spectral_centroid: 2000.0,
                zero_crossing_rate: 0.1,
            },
        }
    }

    #[test]
    fn test_pitch_class() {
        assert_eq!(pitch_class(440.0), 9);
        assert_eq!(pitch_class(880.0), 9);
        assert_eq!(pitch_class(261.63), 0);
        assert_eq!(pitch_class(1320.0), 4);
    }

    #[tokio::test]
    async fn test_a_minor_at_128() {
        // A, C (minor third), E
        let req = request(vec![440.0, 523.25, 659.25], vec![468.75; 8], 0.6);
        let raw = HeuristicAnalyzer.analyze(&req).await.unwrap();

        assert_eq!(raw.key, "A minor");
        assert!((raw.bpm - 128.0).abs() < 1e-9);
        assert_eq!(raw.energy, 6.0);
        assert_eq!(raw.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_major_third_means_major() {
        // C, E (major third), G
        let req = request(vec![261.63, 329.63, 392.0], vec![500.0], 0.3);
        let raw = HeuristicAnalyzer.analyze(&req).await.unwrap();
        assert_eq!(raw.key, "C major");
        assert_eq!(raw.bpm, 120.0);
    }

    #[tokio::test]
    async fn test_out_of_scale_peaks_lower_confidence() {
        // A, C, plus A# which is outside A minor
        let req = request(vec![440.0, 523.25, 466.16, 440.0], vec![500.0], 0.5);
        let raw = HeuristicAnalyzer.analyze(&req).await.unwrap();
        assert_eq!(raw.confidence, 0.75);
    }

    #[tokio::test]
    async fn test_missing_features_fail() {
        let no_peaks = request(vec![], vec![500.0], 0.5);
        assert!(matches!(
            HeuristicAnalyzer.analyze(&no_peaks).await,
            Err(Error::Analysis(_))
        ));

        let no_beats = request(vec![440.0], vec![0.0, -3.0], 0.5);
        assert!(matches!(
            HeuristicAnalyzer.analyze(&no_beats).await,
            Err(Error::Analysis(_))
        ));
    }
}
