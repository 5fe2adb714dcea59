//! Configuration loading and engine tuning constants
//!
//! Bootstrap configuration comes from a TOML file. Resolution order for
//! the file itself and for the analysis service URL:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file in the platform config directory
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged
//! and compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "HILITE_CONFIG";

/// Environment variable overriding the analysis service base URL
pub const ANALYSIS_URL_ENV: &str = "HILITE_ANALYSIS_URL";

/// Window used to group comment timestamps that refer to the same moment
pub const DEFAULT_COMMENT_WINDOW_SECS: f64 = 20.0;

/// Window used for the final cross-source de-duplication
pub const DEFAULT_MERGE_WINDOW_SECS: f64 = 1.0;

/// A comment must have strictly more likes than this to contribute
pub const DEFAULT_MIN_COMMENT_LIKES: u64 = 10;

/// Interval between analysis status polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Poll attempts before an analysis job times out
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 90;

/// Playback position sampling interval
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 500;

/// HTTP request timeout for external services
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default analysis service base URL
pub const DEFAULT_ANALYSIS_BASE_URL: &str = "http://127.0.0.1:5000";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the audio analysis / heatmap service
    #[serde(default)]
    pub analysis_base_url: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Engine tuning (optional, every field has a default)
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Tunable engine constants
///
/// The comment window and the merge window differ by more than an order
/// of magnitude; they serve different purposes and are kept separate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Clustering window for comment timestamps (seconds)
    pub comment_window_secs: f64,
    /// Cross-source de-duplication window (seconds)
    pub merge_window_secs: f64,
    /// Like-count threshold; comments must exceed it
    pub min_comment_likes: u64,
    /// Interval between analysis status polls (milliseconds)
    pub poll_interval_ms: u64,
    /// Maximum number of status polls per job
    pub max_poll_attempts: u32,
    /// Playback position sampling interval (milliseconds)
    pub sample_interval_ms: u64,
    /// HTTP request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            comment_window_secs: DEFAULT_COMMENT_WINDOW_SECS,
            merge_window_secs: DEFAULT_MERGE_WINDOW_SECS,
            min_comment_likes: DEFAULT_MIN_COMMENT_LIKES,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl EngineSettings {
    /// Validate ranges; windows must be finite and non-negative, intervals non-zero
    pub fn validate(&self) -> Result<()> {
        for (name, window) in [
            ("comment_window_secs", self.comment_window_secs),
            ("merge_window_secs", self.merge_window_secs),
        ] {
            if !window.is_finite() || window < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a finite value >= 0, got {}",
                    name, window
                )));
            }
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be > 0".to_string()));
        }
        if self.max_poll_attempts == 0 {
            return Err(Error::Config("max_poll_attempts must be > 0".to_string()));
        }
        if self.sample_interval_ms == 0 {
            return Err(Error::Config("sample_interval_ms must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where a loaded [`TomlConfig`] came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    /// No config file located
    Defaults,
    /// Parsed from this file
    File(PathBuf),
    /// File located but unreadable or invalid; defaults used
    Fallback { path: PathBuf, reason: String },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::Defaults => info!("No config file found, using compiled defaults"),
            ConfigOrigin::File(path) => info!(path = %path.display(), "Loaded config"),
            ConfigOrigin::Fallback { path, reason } => warn!(
                path = %path.display(),
                error = %reason,
                "Ignoring config file, using compiled defaults"
            ),
        }
    }
}

/// Resolves the configuration file and derived values in priority order
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    cli_config_path: Option<PathBuf>,
    cli_analysis_url: Option<String>,
}

impl ConfigResolver {
    pub fn new(cli_config_path: Option<PathBuf>, cli_analysis_url: Option<String>) -> Self {
        Self {
            cli_config_path,
            cli_analysis_url,
        }
    }

    /// Path of the TOML file to read, if any can be located
    pub fn config_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_config_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory
        default_config_path().filter(|p| p.exists())
    }

    /// Load the TOML config, degrading to defaults when absent or invalid
    ///
    /// Logs where the config came from. Callers that install their
    /// subscriber from the loaded config use [`resolve`](Self::resolve) and
    /// log the origin afterwards.
    pub fn load(&self) -> TomlConfig {
        let (config, origin) = self.resolve();
        origin.log();
        config
    }

    /// Load the TOML config without logging
    pub fn resolve(&self) -> (TomlConfig, ConfigOrigin) {
        let Some(path) = self.config_path() else {
            return (TomlConfig::default(), ConfigOrigin::Defaults);
        };

        match load_toml_config(&path) {
            Ok(config) => (config, ConfigOrigin::File(path)),
            Err(e) => (
                TomlConfig::default(),
                ConfigOrigin::Fallback {
                    path,
                    reason: e.to_string(),
                },
            ),
        }
    }

    /// Analysis service base URL: CLI → ENV → TOML → compiled default
    pub fn analysis_base_url(&self, toml_config: &TomlConfig) -> String {
        if let Some(url) = self.cli_analysis_url.as_deref().filter(|u| is_non_blank(u)) {
            return url.to_string();
        }
        if let Ok(url) = std::env::var(ANALYSIS_URL_ENV) {
            if is_non_blank(&url) {
                return url;
            }
        }
        if let Some(url) = toml_config.analysis_base_url.as_deref().filter(|u| is_non_blank(u)) {
            return url.to_string();
        }
        DEFAULT_ANALYSIS_BASE_URL.to_string()
    }
}

/// Default config file location: `<config dir>/hilite/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hilite").join("config.toml"))
}

/// Read and parse a TOML config file, validating engine settings
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
    config.engine.validate()?;
    Ok(config)
}

/// Serialize a config to TOML, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn is_non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}
