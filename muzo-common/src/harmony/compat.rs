//! Harmonic compatibility ranking
//!
//! Given a source track and a pool of candidates, keep the candidates whose
//! Camelot code is a wheel neighbor of the source, classify each by the
//! relation that makes it compatible, and order them best-first.

use super::camelot::{CamelotCode, UNMAPPED};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of suggestions returned when the caller does not ask for a limit
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// How a candidate relates to the source key on the wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    /// Same code
    Perfect,
    /// One step clockwise, same ring
    EnergyBoost,
    /// One step counter-clockwise, same ring
    EnergyDrop,
    /// Relative major/minor
    Good,
}

impl Compatibility {
    /// Sort priority, lower is better
    pub fn priority(self) -> u8 {
        match self {
            Compatibility::Perfect => 0,
            Compatibility::EnergyBoost => 1,
            Compatibility::EnergyDrop => 2,
            Compatibility::Good => 3,
        }
    }
}

/// Anything the ranker can score: needs an identity, a stored Camelot code and a tempo
pub trait HarmonicCandidate {
    fn id(&self) -> &str;
    fn camelot_key(&self) -> &str;
    fn bpm(&self) -> f64;
}

/// One ranked suggestion, borrowing the candidate it describes
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion<'a, T> {
    pub track: &'a T,
    pub compatibility: Compatibility,
    pub reason: &'static str,
}

/// Classify `candidate` against `source`. First matching rule wins.
fn classify(source: CamelotCode, candidate: CamelotCode) -> (Compatibility, &'static str) {
    if candidate == source {
        (Compatibility::Perfect, "Perfect match: same key")
    } else if candidate == source.clockwise() {
        (Compatibility::EnergyBoost, "Energy boost: one step clockwise on the wheel")
    } else if candidate == source.counter_clockwise() {
        (Compatibility::EnergyDrop, "Energy drop: one step counter-clockwise on the wheel")
    } else if candidate.number() == source.number() && candidate.mode() != source.mode() {
        (Compatibility::Good, "Mood shift: relative major/minor")
    } else {
        // Unreachable for codes produced by harmonic_neighbors
        (Compatibility::Good, "Harmonically compatible")
    }
}

/// Rank `candidates` by harmonic compatibility with `source`.
///
/// - The source itself is excluded by id, so other tracks sharing its code still match.
/// - Candidates that are not wheel neighbors (including unmapped `?` codes) are dropped.
/// - Order is class priority, then tempo distance to the source, then id.
///   The sort is stable for fully equal keys.
/// - At most `limit` suggestions are returned.
///
/// A source with no usable code (`?`, empty, malformed) yields no suggestions.
pub fn rank<'a, S, T>(source: &S, candidates: &'a [T], limit: usize) -> Vec<Suggestion<'a, T>>
where
    S: HarmonicCandidate + ?Sized,
    T: HarmonicCandidate,
{
    let source_key = source.camelot_key();
    if source_key.is_empty() || source_key == UNMAPPED {
        return Vec::new();
    }
    let Some(source_code) = CamelotCode::parse(source_key) else {
        return Vec::new();
    };
    let neighbors = source_code.neighbors();

    let mut suggestions: Vec<Suggestion<'a, T>> = candidates
        .iter()
        .filter(|candidate| candidate.id() != source.id())
        .filter_map(|candidate| {
            let code = CamelotCode::parse(candidate.camelot_key())?;
            neighbors.contains(&code).then(|| {
                let (compatibility, reason) = classify(source_code, code);
                Suggestion {
                    track: candidate,
                    compatibility,
                    reason,
                }
            })
        })
        .collect();

    let source_bpm = source.bpm();
    let tempo_distance = |track: &T| (track.bpm() - source_bpm).abs();

    suggestions.sort_by(|a, b| {
        a.compatibility
            .priority()
            .cmp(&b.compatibility.priority())
            .then_with(|| tempo_distance(a.track).total_cmp(&tempo_distance(b.track)))
            .then_with(|| a.track.id().cmp(b.track.id()))
    });
    suggestions.truncate(limit);

    debug!(
        source = source.id(),
        code = %source_code,
        pool = candidates.len(),
        matched = suggestions.len(),
        "Ranked harmonic suggestions"
    );

    suggestions
}
