//! Harmonic mixing engine
//!
//! Three pure components composed bottom-up:
//! - [`normalize`]: arbitrary key spellings to one of 24 canonical names
//! - [`camelot`]: canonical names to/from Camelot wheel codes, wheel adjacency
//! - [`compat`]: classification and ranking of harmonically compatible tracks
//!
//! All lookup tables are immutable statics built on first use, so every function
//! here is safe to call from any number of request workers concurrently.

pub mod camelot;
pub mod compat;
pub mod normalize;

pub use camelot::{from_camelot, harmonic_neighbors, to_camelot, wheel, CamelotCode, UNMAPPED};
pub use compat::{rank, Compatibility, HarmonicCandidate, Suggestion, DEFAULT_SUGGESTION_LIMIT};
pub use normalize::{is_canonical, key_for_pitch_class, normalize, Mode, CANONICAL_KEYS};

/// Normalize a raw key spelling and encode it in one step.
///
/// Returns `(canonical_key, camelot_code)`. Unrecognized spellings come back
/// unchanged (trimmed) paired with [`UNMAPPED`].
pub fn resolve_key(raw: &str) -> (String, &'static str) {
    let key = normalize(raw);
    let code = to_camelot(&key);
    (key, code)
}
