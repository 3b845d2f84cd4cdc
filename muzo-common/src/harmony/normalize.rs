//! Key name normalization
//!
//! Maps the many ways a musical key gets written ("G#m", "Abm", "G# minor",
//! "A♭ minor") onto one of the 24 canonical names used everywhere else.
//! Resolution order is canonical set, then alias table, then passthrough:
//! unknown spellings are returned as-is so the codec can report them as unmapped.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Musical mode. Minor keys sit on the A ring of the Camelot wheel, major keys on the B ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Minor,
    Major,
}

impl Mode {
    /// The other mode (relative major/minor)
    pub fn flip(self) -> Self {
        match self {
            Mode::Minor => Mode::Major,
            Mode::Major => Mode::Minor,
        }
    }
}

/// The 24 canonical key names, in Camelot order (1A, 1B, 2A, 2B, ...).
pub const CANONICAL_KEYS: [&str; 24] = [
    "Ab minor", "B major",
    "Eb minor", "Gb major",
    "Bb minor", "Db major",
    "F minor", "Ab major",
    "C minor", "Eb major",
    "G minor", "Bb major",
    "D minor", "F major",
    "A minor", "C major",
    "E minor", "G major",
    "B minor", "D major",
    "Gb minor", "A major",
    "Db minor", "E major",
];

/// Root spellings per pitch class (index 0 = C), with the canonical minor and major names.
const PITCH_CLASSES: [(&[&str], &str, &str); 12] = [
    (&["C"], "C minor", "C major"),
    (&["C#", "Db"], "Db minor", "Db major"),
    (&["D"], "D minor", "D major"),
    (&["D#", "Eb"], "Eb minor", "Eb major"),
    (&["E"], "E minor", "E major"),
    (&["F"], "F minor", "F major"),
    (&["F#", "Gb"], "Gb minor", "Gb major"),
    (&["G"], "G minor", "G major"),
    (&["G#", "Ab"], "Ab minor", "Ab major"),
    (&["A"], "A minor", "A major"),
    (&["A#", "Bb"], "Bb minor", "Bb major"),
    (&["B", "Cb"], "B minor", "B major"),
];

const MINOR_SUFFIXES: [&str; 5] = [" minor", " Minor", "m", "min", " min"];
const MAJOR_SUFFIXES: [&str; 6] = [" major", " Major", "", "maj", " maj", "M"];

static CANONICAL: Lazy<HashSet<&'static str>> = Lazy::new(|| CANONICAL_KEYS.into_iter().collect());

static ALIASES: Lazy<HashMap<String, &'static str>> = Lazy::new(build_aliases);

fn build_aliases() -> HashMap<String, &'static str> {
    let mut aliases = HashMap::new();

    for (roots, minor, major) in PITCH_CLASSES {
        for root in roots.iter().flat_map(|r| root_variants(r)) {
            for suffix in MINOR_SUFFIXES {
                aliases.insert(format!("{root}{suffix}"), minor);
            }
            for suffix in MAJOR_SUFFIXES {
                aliases.insert(format!("{root}{suffix}"), major);
            }
        }
    }

    aliases
}

/// A root as written plus its Unicode-accidental form ("F#" -> "F♯", "Bb" -> "B♭").
fn root_variants(root: &str) -> Vec<String> {
    let mut variants = vec![root.to_string()];
    let mut chars = root.chars();
    if let (Some(letter), Some(accidental)) = (chars.next(), chars.next()) {
        let unicode = match accidental {
            '#' => '♯',
            'b' => '♭',
            _ => return variants,
        };
        variants.push(format!("{letter}{unicode}"));
    }
    variants
}

/// Normalize a key spelling to its canonical name.
///
/// Only leading and trailing whitespace is ignored; aliases are exact strings.
/// Unrecognized input is returned trimmed but otherwise unchanged.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();

    if CANONICAL.contains(trimmed) {
        return trimmed.to_string();
    }

    match ALIASES.get(trimmed) {
        Some(canonical) => (*canonical).to_string(),
        None => trimmed.to_string(),
    }
}

/// Whether `key` is one of the 24 canonical names
pub fn is_canonical(key: &str) -> bool {
    CANONICAL.contains(key)
}

/// Canonical key name for a pitch class (0 = C, 11 = B). Values wrap modulo 12.
pub fn key_for_pitch_class(pitch_class: u8, mode: Mode) -> &'static str {
    let (_, minor, major) = PITCH_CLASSES[usize::from(pitch_class % 12)];
    match mode {
        Mode::Minor => minor,
        Mode::Major => major,
    }
}
