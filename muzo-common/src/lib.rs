//! # Muzo Common Library
//!
//! Shared code for the Muzo services including:
//! - Key normalization and the Camelot wheel codec
//! - Harmonic compatibility ranking
//! - Track and playlist domain models
//! - Configuration loading
//! - The common error type

pub mod config;
pub mod error;
pub mod harmony;
pub mod models;

pub use error::{Error, Result};
pub use harmony::{CamelotCode, Compatibility, Mode, Suggestion};
pub use models::{AnalysisMethod, Playlist, Track};
