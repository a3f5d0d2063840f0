//! `capdex` Configuration Module
//!
//! Provides configuration file support via `capdex.toml`, environment variables,
//! and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (API)
//! 2. Environment variables (`CAPDEX_*`, nested keys separated by `__`,
//!    e.g. `CAPDEX_INDEX__PRUNE_THRESHOLD=8000`)
//! 3. Configuration file (`capdex.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default fragment length for the inverted index.
pub const DEFAULT_FRAGMENT_LEN: usize = 5;
/// Default prefix length for fallback buckets.
pub const DEFAULT_PREFIX_LEN: usize = 3;
/// Default posting-list length above which a fragment is pruned.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 5000;
/// Default bound on `Parent` chain length.
pub const DEFAULT_MAX_PARENT_DEPTH: usize = 64;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Index build configuration section.
///
/// These values were tuned on the full browscap corpus; changing them is a
/// performance decision, not a correctness one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Length of the substring fragments used as inverted-index keys.
    pub fragment_len: usize,
    /// Length of the prefix used to bucket patterns for the fallback scan.
    pub prefix_len: usize,
    /// Fragments with more postings than this are dropped at finalize.
    pub prune_threshold: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            fragment_len: DEFAULT_FRAGMENT_LEN,
            prefix_len: DEFAULT_PREFIX_LEN,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
        }
    }
}

/// Attribute resolution configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Maximum number of `Parent` hops followed before giving up.
    pub max_parent_depth: usize,
    /// Cache resolved attribute sets per pattern for the lifetime of an index.
    pub memoize: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            max_parent_depth: DEFAULT_MAX_PARENT_DEPTH,
            memoize: true,
        }
    }
}

/// Record source configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Section carrying the database version marker.
    pub version_section: String,
    /// Attribute key holding the version inside `version_section`.
    pub version_key: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            version_section: "GJK_Browscap_Version".to_string(),
            version_key: "Version".to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `capdex` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CapdexConfig {
    /// Index build configuration.
    pub index: IndexConfig,
    /// Attribute resolution configuration.
    pub resolve: ResolveConfig,
    /// Record source configuration.
    pub source: SourceConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl CapdexConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("capdex.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error: defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CAPDEX_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=32).contains(&self.index.fragment_len) {
            return Err(ConfigError::InvalidValue {
                key: "index.fragment_len".to_string(),
                message: format!("value {} is out of range [2, 32]", self.index.fragment_len),
            });
        }

        if !(1..=8).contains(&self.index.prefix_len) {
            return Err(ConfigError::InvalidValue {
                key: "index.prefix_len".to_string(),
                message: format!("value {} is out of range [1, 8]", self.index.prefix_len),
            });
        }

        if self.index.prune_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "index.prune_threshold".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if !(1..=1024).contains(&self.resolve.max_parent_depth) {
            return Err(ConfigError::InvalidValue {
                key: "resolve.max_parent_depth".to_string(),
                message: format!(
                    "value {} is out of range [1, 1024]",
                    self.resolve.max_parent_depth
                ),
            });
        }

        if self.source.version_section.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "source.version_section".to_string(),
                message: "value must not be empty".to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
