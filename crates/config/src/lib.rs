//! Configuration loading and validation for RustedCode.
//!
//! Loads configuration from `~/.rustedcode/config.toml` with environment
//! variable overrides. Validates all settings at startup; nothing is
//! reloaded afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.rustedcode/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Context memory configuration
    #[serde(default)]
    pub context: ContextConfig,
}

/// Capacities and thresholds for the tiered context memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Immediate tier size before the oldest item is promoted to short-term.
    #[serde(default = "default_max_immediate_items")]
    pub max_immediate_items: usize,

    /// Short-term tier size that makes automatic compaction eligible.
    #[serde(default = "default_max_short_term_items")]
    pub max_short_term_items: usize,

    /// Target compressed/original ratio. Reported, never enforced.
    #[serde(default = "default_compression_ratio")]
    pub compression_ratio: f64,

    /// Items scoring below this are dropped from query results.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
}

fn default_max_immediate_items() -> usize {
    50
}
fn default_max_short_term_items() -> usize {
    200
}
fn default_compression_ratio() -> f64 {
    0.3
}
fn default_relevance_threshold() -> f64 {
    0.1
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_immediate_items: default_max_immediate_items(),
            max_short_term_items: default_max_short_term_items(),
            compression_ratio: default_compression_ratio(),
            relevance_threshold: default_relevance_threshold(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.rustedcode/config.toml).
    ///
    /// Environment variables override file values:
    /// - `RUSTEDCODE_MAX_IMMEDIATE_ITEMS`
    /// - `RUSTEDCODE_MAX_SHORT_TERM_ITEMS`
    /// - `RUSTEDCODE_RELEVANCE_THRESHOLD`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("RUSTEDCODE_MAX_IMMEDIATE_ITEMS") {
            self.context.max_immediate_items = v;
        }
        if let Some(v) = env_parse("RUSTEDCODE_MAX_SHORT_TERM_ITEMS") {
            self.context.max_short_term_items = v;
        }
        if let Some(v) = env_parse("RUSTEDCODE_RELEVANCE_THRESHOLD") {
            self.context.relevance_threshold = v;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".rustedcode")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ctx = &self.context;
        if ctx.max_immediate_items == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_immediate_items must be > 0".into(),
            ));
        }
        if ctx.max_short_term_items == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_short_term_items must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&ctx.relevance_threshold) {
            return Err(ConfigError::ValidationError(
                "context.relevance_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&ctx.compression_ratio) {
            return Err(ConfigError::ValidationError(
                "context.compression_ratio must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Parse an env var, ignoring (with a warning) values that don't parse.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
