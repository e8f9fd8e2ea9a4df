// crates/pact-broker-config/src/lib.rs
// ============================================================================
// Module: Pact Broker Config
// Description: Publish configuration model, load guards, and validation.
// Purpose: Load a strict TOML description of a pact publishing run.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! [`PublishConfig`] describes one publishing run: the consumer version, the
//! pact files to publish, whether to merge pacts per consumer/provider pair,
//! the per-file size cap, and the event log format.
//! Invariants:
//! - Config files are size-capped, UTF-8, and path-length checked before parsing.
//! - Unknown keys are rejected.
//! - Loaded configs are always validated.
//! - Relative pact paths are resolved against the config file directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Environment variable naming the config file when no path is supplied.
pub const CONFIG_ENV_VAR: &str = "PACT_PUBLISH_CONFIG";
/// Config file name used when neither a path nor the env var is supplied.
pub const DEFAULT_CONFIG_FILE: &str = "pact-publish.toml";
/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;
/// Maximum total config path length in bytes.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single config path component in bytes.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Default per-file pact size cap in bytes.
pub const DEFAULT_MAX_PACT_BYTES: usize = 10 * 1024 * 1024;
/// Upper bound accepted for `max_pact_bytes`.
pub const MAX_PACT_BYTES_LIMIT: usize = 100 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Config file is not valid TOML for the schema.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config contents violate a validation rule.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Event log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Events are discarded.
    #[default]
    None,
    /// One JSON object per event on stderr.
    Json,
}

/// Event log settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Configuration for one pact publishing run.
///
/// # Invariants
/// - `validate` must pass before the config is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Consumer application version the pacts are published under.
    pub consumer_version: String,
    /// Pact files to publish, in order.
    pub pact_files: Vec<PathBuf>,
    /// Merge pacts that share a consumer/provider pair before publishing.
    #[serde(default)]
    pub merge: bool,
    /// Per-file size cap in bytes.
    #[serde(default = "default_max_pact_bytes")]
    pub max_pact_bytes: usize,
    /// Event log settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Returns the default per-file size cap.
const fn default_max_pact_bytes() -> usize {
    DEFAULT_MAX_PACT_BYTES
}

impl PublishConfig {
    /// Creates a config with defaults for the optional fields.
    #[must_use]
    pub fn new(consumer_version: impl Into<String>, pact_files: Vec<PathBuf>) -> Self {
        Self {
            consumer_version: consumer_version.into(),
            pact_files,
            merge: false,
            max_pact_bytes: DEFAULT_MAX_PACT_BYTES,
            log: LogConfig::default(),
        }
    }

    /// Loads and validates a config file.
    ///
    /// The path is taken from `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_FILE`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path, file, or contents are invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_path(path);
        validate_path(&path)?;
        let text = read_config_text(&path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        Ok(config)
    }

    /// Parses and validates config text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates field values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.consumer_version.trim().is_empty() {
            return Err(invalid("consumer_version must be non-empty"));
        }
        if self.pact_files.is_empty() {
            return Err(invalid("pact_files must list at least one file"));
        }
        if self.pact_files.iter().any(|path| path.as_os_str().is_empty()) {
            return Err(invalid("pact_files entries must be non-empty"));
        }
        if self.max_pact_bytes == 0 {
            return Err(invalid("max_pact_bytes must be greater than zero"));
        }
        if self.max_pact_bytes > MAX_PACT_BYTES_LIMIT {
            return Err(invalid("max_pact_bytes exceeds limit"));
        }
        Ok(())
    }

    /// Joins relative pact paths onto `base`.
    fn resolve_relative_paths(&mut self, base: &Path) {
        for path in &mut self.pact_files {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

// ============================================================================
// SECTION: Load Helpers
// ============================================================================

/// Builds an [`ConfigError::Invalid`] error.
fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

/// Picks the config path from the argument, env var, or default.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    resolve_path_with(path, env::var_os(CONFIG_ENV_VAR))
}

/// Picks the config path from the argument, then `env_value`, then the default file.
fn resolve_path_with(path: Option<&Path>, env_value: Option<OsString>) -> PathBuf {
    if let Some(path) = path {
        return path.to_path_buf();
    }
    env_value.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
}

/// Rejects overlong paths and path components.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(invalid("config path exceeds max length"));
    }
    for component in path.components() {
        if let Component::Normal(segment) = component
            && segment.len() > MAX_PATH_COMPONENT_LENGTH
        {
            return Err(invalid("config path component too long"));
        }
    }
    Ok(())
}

/// Reads config text with size and encoding guards.
fn read_config_text(path: &Path) -> Result<String, ConfigError> {
    let file = File::open(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    let declared = file.metadata().map_err(|err| ConfigError::Io(err.to_string()))?.len();
    if declared > MAX_CONFIG_FILE_SIZE {
        return Err(invalid("config file exceeds size limit"));
    }
    let mut bytes = Vec::new();
    file.take(MAX_CONFIG_FILE_SIZE + 1)
        .read_to_end(&mut bytes)
        .map_err(|err| ConfigError::Io(err.to_string()))?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > MAX_CONFIG_FILE_SIZE {
        return Err(invalid("config file exceeds size limit"));
    }
    String::from_utf8(bytes).map_err(|_| invalid("config file must be utf-8"))
}
