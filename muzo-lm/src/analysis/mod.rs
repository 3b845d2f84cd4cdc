//! Audio analysis seam
//!
//! An [`Analyzer`] turns client-extracted audio features into an unvalidated
//! key/tempo/energy guess. [`analyze`] runs the configured analyzer and puts its
//! answer through the same normalization as user input: the key is normalized
//! and encoded, energy is clamped, and nonsense tempo or confidence is rejected.

pub mod heuristic;
pub mod remote;

use async_trait::async_trait;
use muzo_common::config::{AnalysisConfig, AnalysisProvider};
use muzo_common::harmony::resolve_key;
use muzo_common::models::{clamp_energy, validate_bpm};
use muzo_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub use heuristic::HeuristicAnalyzer;
pub use remote::RemoteAnalyzer;

/// Features the browser extracts before asking for an analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFeatures {
    /// Strongest spectral peaks in Hz, dominant first
    pub frequency_peaks: Vec<f64>,
    /// Milliseconds between detected beats
    pub beat_intervals: Vec<f64>,
    /// Mean amplitude, 0.0..=1.0
    pub avg_amplitude: f64,
    pub peak_amplitude: f64,
    pub spectral_centroid: f64,
    pub zero_crossing_rate: f64,
}

/// Body of `POST /api/analyze-ai`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub audio_features: AudioFeatures,
}

/// What an analyzer reports, before any checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysis {
    pub key: String,
    pub bpm: f64,
    pub energy: f64,
    pub confidence: f64,
}

/// Validated analysis, shaped like a track's musical fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub key: String,
    pub camelot_key: String,
    pub bpm: f64,
    pub energy: i64,
    pub confidence: f64,
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<RawAnalysis>;
}

/// Build the analyzer named by the configuration
pub fn build_analyzer(config: &AnalysisConfig) -> Result<Arc<dyn Analyzer>> {
    match config.provider {
        AnalysisProvider::Heuristic => Ok(Arc::new(HeuristicAnalyzer)),
        AnalysisProvider::Remote => {
            let analyzer = RemoteAnalyzer::new(config)?;
            if !analyzer.is_configured() {
                warn!("Remote analysis selected without endpoint and API key; requests will fail");
            }
            Ok(Arc::new(analyzer))
        }
    }
}

/// Run `analyzer` and validate its answer
pub async fn analyze(analyzer: &dyn Analyzer, request: &AnalysisRequest) -> Result<AnalysisResult> {
    let raw = analyzer.analyze(request).await.map_err(|e| {
        warn!(analyzer = analyzer.name(), filename = %request.filename, "Analysis failed: {}", e);
        e
    })?;

    let result = accept(raw)?;
    info!(
        analyzer = analyzer.name(),
        filename = %request.filename,
        key = %result.key,
        camelot_key = %result.camelot_key,
        bpm = result.bpm,
        "Analysis complete"
    );
    Ok(result)
}

/// Validate and normalize raw analyzer output
pub fn accept(raw: RawAnalysis) -> Result<AnalysisResult> {
    if raw.key.trim().is_empty() {
        return Err(Error::Analysis("Analyzer returned no key".to_string()));
    }
    validate_bpm(raw.bpm).map_err(|_| {
        Error::Analysis(format!("Analyzer returned an invalid tempo: {}", raw.bpm))
    })?;
    if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
        return Err(Error::Analysis(format!(
            "Analyzer returned an invalid confidence: {}",
            raw.confidence
        )));
    }
    if !raw.energy.is_finite() {
        return Err(Error::Analysis(format!(
            "Analyzer returned an invalid energy: {}",
            raw.energy
        )));
    }

    let (key, camelot_key) = resolve_key(&raw.key);

    Ok(AnalysisResult {
        key,
        camelot_key: camelot_key.to_string(),
        bpm: raw.bpm,
        // Saturating cast, then clamp
        energy: clamp_energy(raw.energy.round() as i64),
        confidence: raw.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(key: &str, bpm: f64, energy: f64, confidence: f64) -> RawAnalysis {
        RawAnalysis {
            key: key.to_string(),
            bpm,
            energy,
            confidence,
        }
    }

    #[test]
    fn test_accept_normalizes_like_user_input() {
        let result = accept(raw("F#m", 128.0, 7.4, 0.9)).unwrap();
        assert_eq!(result.key, "Gb minor");
        assert_eq!(result.camelot_key, "11A");
        assert_eq!(result.energy, 7);
    }

    #[test]
    fn test_accept_clamps_energy() {
        assert_eq!(accept(raw("Am", 120.0, 0.0, 0.5)).unwrap().energy, 1);
        assert_eq!(accept(raw("Am", 120.0, 42.0, 0.5)).unwrap().energy, 10);
    }

    #[test]
    fn test_unmapped_key_is_not_a_failure() {
        let result = accept(raw("H dorian", 120.0, 5.0, 0.5)).unwrap();
        assert_eq!(result.key, "H dorian");
        assert_eq!(result.camelot_key, "?");
    }

    #[test]
    fn test_accept_rejects_nonsense() {
        for bad in [
            raw("", 120.0, 5.0, 0.5),
            raw("Am", 0.0, 5.0, 0.5),
            raw("Am", f64::NAN, 5.0, 0.5),
            raw("Am", 120.0, 5.0, 1.5),
            raw("Am", 120.0, 5.0, f64::INFINITY),
            raw("Am", 120.0, f64::NAN, 0.5),
        ] {
            assert!(matches!(accept(bad), Err(Error::Analysis(_))));
        }
    }

    #[tokio::test]
    async fn test_build_default_analyzer() {
        let analyzer = build_analyzer(&AnalysisConfig::default()).unwrap();
        assert_eq!(analyzer.name(), "heuristic");
    }
}
