//! Camelot wheel notation
//!
//! The wheel places the 24 keys on two concentric rings of twelve positions:
//! - Numbers 1-12 are positions on the wheel, one fifth apart
//! - 'A' suffix = minor key, 'B' suffix = major key
//! - Adjacent numbers with the same letter mix smoothly (energy boost / drop)
//! - Same number, different letter = relative major/minor

use super::normalize::Mode;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Code stored for keys the codec cannot place on the wheel
pub const UNMAPPED: &str = "?";

/// Camelot code to canonical key name, in wheel order
const WHEEL: [(&str, &str); 24] = [
    ("1A", "Ab minor"), ("1B", "B major"),
    ("2A", "Eb minor"), ("2B", "Gb major"),
    ("3A", "Bb minor"), ("3B", "Db major"),
    ("4A", "F minor"), ("4B", "Ab major"),
    ("5A", "C minor"), ("5B", "Eb major"),
    ("6A", "G minor"), ("6B", "Bb major"),
    ("7A", "D minor"), ("7B", "F major"),
    ("8A", "A minor"), ("8B", "C major"),
    ("9A", "E minor"), ("9B", "G major"),
    ("10A", "B minor"), ("10B", "D major"),
    ("11A", "Gb minor"), ("11B", "A major"),
    ("12A", "Db minor"), ("12B", "E major"),
];

static KEY_TO_CAMELOT: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| WHEEL.iter().map(|&(code, key)| (key, code)).collect());

static CAMELOT_TO_KEY: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| WHEEL.iter().copied().collect());

/// A position on the Camelot wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CamelotCode {
    number: u8,
    mode: Mode,
}

impl CamelotCode {
    /// Build a code from a wheel position (1-12) and mode
    pub fn new(number: u8, mode: Mode) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self { number, mode })
    }

    /// Parse `{1..12}{A|B}`. Anything else (too short, non-numeric prefix,
    /// out-of-range number, other letter) is `None`.
    pub fn parse(code: &str) -> Option<Self> {
        if code.len() < 2 || !code.is_ascii() {
            return None;
        }

        let (digits, letter) = code.split_at(code.len() - 1);
        if digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mode = match letter {
            "A" => Mode::Minor,
            "B" => Mode::Major,
            _ => return None,
        };

        Self::new(digits.parse().ok()?, mode)
    }

    pub fn number(self) -> u8 {
        self.number
    }

    pub fn mode(self) -> Mode {
        self.mode
    }

    /// Ring letter: 'A' for minor, 'B' for major
    pub fn letter(self) -> char {
        match self.mode {
            Mode::Minor => 'A',
            Mode::Major => 'B',
        }
    }

    /// One step clockwise, wrapping 12 -> 1 (energy boost)
    pub fn clockwise(self) -> Self {
        Self {
            number: self.number % 12 + 1,
            mode: self.mode,
        }
    }

    /// One step counter-clockwise, wrapping 1 -> 12 (energy drop)
    pub fn counter_clockwise(self) -> Self {
        Self {
            number: (self.number + 10) % 12 + 1,
            mode: self.mode,
        }
    }

    /// Same position on the other ring (relative major/minor)
    pub fn relative(self) -> Self {
        Self {
            number: self.number,
            mode: self.mode.flip(),
        }
    }

    /// Identity, energy boost, energy drop and relative neighbor, in that order
    pub fn neighbors(self) -> [Self; 4] {
        [self, self.clockwise(), self.counter_clockwise(), self.relative()]
    }

    /// Canonical key name at this position
    pub fn key(self) -> &'static str {
        WHEEL[usize::from(self.number - 1) * 2 + usize::from(self.mode == Mode::Major)].1
    }
}

impl fmt::Display for CamelotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.letter())
    }
}

/// Camelot code for a canonical key name, or [`UNMAPPED`]
pub fn to_camelot(canonical_key: &str) -> &'static str {
    KEY_TO_CAMELOT.get(canonical_key).copied().unwrap_or(UNMAPPED)
}

/// Canonical key name for a Camelot code
pub fn from_camelot(code: &str) -> Option<&'static str> {
    CAMELOT_TO_KEY.get(code).copied()
}

/// Codes that mix harmonically with `code`: itself, one step either way on the
/// same ring, and the relative major/minor. Malformed codes have no neighbors.
pub fn harmonic_neighbors(code: &str) -> HashSet<CamelotCode> {
    CamelotCode::parse(code)
        .map(|c| c.neighbors().into_iter().collect())
        .unwrap_or_default()
}

/// The full wheel as `(code, canonical key)` pairs in wheel order
pub fn wheel() -> impl Iterator<Item = (&'static str, &'static str)> {
    WHEEL.iter().copied()
}
