//! Command line and effective settings for muzo-lm
//!
//! Priority per setting: CLI argument, environment variable (both via clap),
//! TOML file, compiled default.

use clap::Parser;
use muzo_common::config::{
    default_config_path, default_root_folder, load_or_default, resolve, AnalysisConfig,
    AnalysisProvider, ConfigSource, TomlConfig, DEFAULT_BIND,
};
use std::path::PathBuf;

/// Module name, also the TOML file stem
pub const MODULE_NAME: &str = "muzo-lm";

/// Command-line arguments for muzo-lm
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "muzo-lm")]
#[command(about = "Muzo Library Manager: harmonic track library service")]
#[command(version)]
pub struct Args {
    /// TOML config file (default: <config dir>/muzo/muzo-lm.toml)
    #[arg(long, env = "MUZO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Folder holding the library database
    #[arg(short, long, env = "MUZO_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8000
    #[arg(short, long, env = "MUZO_BIND")]
    pub bind: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "MUZO_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Analyzer behind /api/analyze-ai: heuristic or remote
    #[arg(long, env = "MUZO_ANALYSIS_PROVIDER")]
    pub analysis_provider: Option<AnalysisProvider>,

    /// Remote analysis endpoint URL
    #[arg(long, env = "MUZO_ANALYSIS_ENDPOINT")]
    pub analysis_endpoint: Option<String>,

    /// Remote analysis API key
    #[arg(long, env = "MUZO_ANALYSIS_API_KEY", hide_env_values = true)]
    pub analysis_api_key: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub root_folder: PathBuf,
    pub bind: String,
    pub log_level: String,
    pub analysis: AnalysisConfig,
}

impl Settings {
    /// Read the TOML file named by `args` (or the default location) and resolve.
    ///
    /// The returned [`ConfigSource`] should be logged once tracing is up.
    pub fn load(args: Args) -> (Self, ConfigSource) {
        let path = args
            .config
            .clone()
            .or_else(|| default_config_path(MODULE_NAME));
        let (toml, source) = load_or_default(path.as_deref());
        (Self::resolve(args, toml), source)
    }

    /// Merge CLI/ENV values over the TOML file over defaults
    pub fn resolve(args: Args, toml: TomlConfig) -> Self {
        let analysis = AnalysisConfig {
            provider: resolve(args.analysis_provider, Some(toml.analysis.provider), Default::default),
            endpoint: args.analysis_endpoint.or(toml.analysis.endpoint),
            api_key: args.analysis_api_key.or(toml.analysis.api_key),
            timeout_secs: toml.analysis.timeout_secs,
        };

        Self {
            root_folder: resolve(args.root_folder, toml.root_folder, default_root_folder),
            bind: resolve(args.bind, toml.bind, || DEFAULT_BIND.to_string()),
            log_level: resolve(args.log_level, Some(toml.logging.level), || "info".to_string()),
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muzo_common::config::LoggingConfig;

    #[test]
    fn test_defaults_without_anything() {
        let settings = Settings::resolve(Args::default(), TomlConfig::default());
        assert_eq!(settings.bind, DEFAULT_BIND);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.root_folder, default_root_folder());
        assert_eq!(settings.analysis.provider, AnalysisProvider::Heuristic);
    }

    #[test]
    fn test_cli_beats_toml() {
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            bind: Some("0.0.0.0:9000".to_string()),
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
            analysis: AnalysisConfig {
                provider: AnalysisProvider::Remote,
                endpoint: Some("http://toml/analyze".to_string()),
                api_key: Some("toml-key".to_string()),
                timeout_secs: 7,
            },
        };
        let args = Args {
            root_folder: Some(PathBuf::from("/from/cli")),
            analysis_api_key: Some("cli-key".to_string()),
            ..Default::default()
        };

        let settings = Settings::resolve(args, toml);
        assert_eq!(settings.root_folder, PathBuf::from("/from/cli"));
        assert_eq!(settings.bind, "0.0.0.0:9000");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.analysis.provider, AnalysisProvider::Remote);
        assert_eq!(settings.analysis.endpoint.as_deref(), Some("http://toml/analyze"));
        assert_eq!(settings.analysis.api_key.as_deref(), Some("cli-key"));
        assert_eq!(settings.analysis.timeout_secs, 7);
    }

    #[test]
    fn test_parse_cli() {
        let args = Args::try_parse_from([
            "muzo-lm",
            "--root-folder",
            "/srv/muzo",
            "--analysis-provider",
            "remote",
        ])
        .unwrap();
        assert_eq!(args.root_folder, Some(PathBuf::from("/srv/muzo")));
        assert_eq!(args.analysis_provider, Some(AnalysisProvider::Remote));

        assert!(Args::try_parse_from(["muzo-lm", "--analysis-provider", "oracle"]).is_err());
    }
}
