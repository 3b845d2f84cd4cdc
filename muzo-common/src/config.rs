//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are parsed by each binary (clap with `env`); this module owns
//! tiers 3 and 4. A missing or broken TOML file is never fatal.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "muzo.db";

/// Default HTTP listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Contents of `<config dir>/muzo/<module>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which analyzer answers `/api/analyze-ai`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisProvider {
    /// Local estimate from the submitted audio features
    #[default]
    Heuristic,
    /// External model behind an HTTP endpoint
    Remote,
}

impl std::str::FromStr for AnalysisProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "heuristic" => Ok(AnalysisProvider::Heuristic),
            "remote" => Ok(AnalysisProvider::Remote),
            other => Err(Error::Config(format!(
                "Unknown analysis provider '{other}' (expected 'heuristic' or 'remote')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub provider: AnalysisProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_analysis_timeout")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider: AnalysisProvider::default(),
            endpoint: None,
            api_key: None,
            timeout_secs: default_analysis_timeout(),
        }
    }
}

fn default_analysis_timeout() -> u64 {
    30
}

/// Default TOML location for a module: `<config dir>/muzo/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("muzo").join(format!("{module_name}.toml")))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("muzo"))
        .unwrap_or_else(|| PathBuf::from("./muzo_data"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
}

/// Where the effective TOML settings came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// No config path was available on this platform
    Defaults,
    /// Path resolved but no file there
    Missing(PathBuf),
    /// File parsed successfully
    Loaded(PathBuf),
    /// File present but unreadable or invalid; defaults used instead
    Invalid(PathBuf, String),
}

impl ConfigSource {
    /// Report the outcome. Called once tracing is installed, since the config
    /// file itself decides the log level.
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => info!("No config directory, using defaults"),
            ConfigSource::Missing(path) => {
                info!("No config file at {}, using defaults", path.display())
            }
            ConfigSource::Loaded(path) => info!("Loaded config file {}", path.display()),
            ConfigSource::Invalid(path, reason) => {
                warn!("Ignoring config file {}: {}", path.display(), reason)
            }
        }
    }

    /// Write a default config file where none exists yet, so there is a
    /// file to edit. Best-effort: a failed write is logged and ignored.
    ///
    /// Returns whether a file was written.
    pub fn seed_if_missing(&self) -> bool {
        let ConfigSource::Missing(path) = self else {
            return false;
        };

        match write_toml_config(&TomlConfig::default(), path) {
            Ok(()) => {
                info!("Wrote default config file {}", path.display());
                true
            }
            Err(e) => {
                warn!("Could not write default config file {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// Load the TOML config if present, falling back to defaults.
///
/// Never fails: a broken file degrades to defaults and is reported through
/// the returned [`ConfigSource`].
pub fn load_or_default(path: Option<&Path>) -> (TomlConfig, ConfigSource) {
    let Some(path) = path else {
        return (TomlConfig::default(), ConfigSource::Defaults);
    };

    if !path.exists() {
        return (TomlConfig::default(), ConfigSource::Missing(path.to_path_buf()));
    }

    match load_toml_config(path) {
        Ok(config) => (config, ConfigSource::Loaded(path.to_path_buf())),
        Err(e) => (
            TomlConfig::default(),
            ConfigSource::Invalid(path.to_path_buf(), e.to_string()),
        ),
    }
}

/// Write a config file atomically, creating parent folders as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Write to a sibling temp file and rename so readers never see a partial file
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;

    Ok(())
}

/// Pick the first value present among CLI/ENV and TOML, else the default
pub fn resolve<T>(cli_or_env: Option<T>, toml: Option<T>, default: impl FnOnce() -> T) -> T {
    cli_or_env.or(toml).unwrap_or_else(default)
}

/// Create the root folder if missing and return the database path inside it
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE))
}
