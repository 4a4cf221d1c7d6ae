//! Application configuration.
//!
//! Loaded from a single optional `cardscan.toml`, merged over stock defaults.
//! A missing file means "all defaults"; a file that exists must parse and
//! validate.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [extraction]
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//! model = "gemini-2.5-flash"
//! api_key_env = "GEMINI_API_KEY"   # Name of the env var holding the key
//! timeout_secs = 60
//!
//! [storage]
//! data_dir = ".cardscan"
//! records_file = "records.json"
//! preferences_file = "preferences.json"
//! ```
//!
//! The API key itself never lives in the file, only the name of the
//! environment variable it is read from.
//!
//! Unknown keys are rejected to catch typos early.

use crate::extract::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("API key not set: export {0}")]
    MissingApiKey(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Extraction service connection settings.
    pub extraction: ExtractionConfig,
    /// Where records and preferences are stored.
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation(
                "extraction.endpoint must not be empty".into(),
            ));
        }
        if !self.extraction.endpoint.starts_with("http://")
            && !self.extraction.endpoint.starts_with("https://")
        {
            return Err(ConfigError::Validation(
                "extraction.endpoint must be an http(s) URL".into(),
            ));
        }
        if self.extraction.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "extraction.model must not be empty".into(),
            ));
        }
        if self.extraction.api_key_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "extraction.api_key_env must not be empty".into(),
            ));
        }
        if self.extraction.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "extraction.timeout_secs must be at least 1".into(),
            ));
        }
        for (key, value) in [
            ("storage.records_file", &self.storage.records_file),
            ("storage.preferences_file", &self.storage.preferences_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.storage.records_file == self.storage.preferences_file {
            return Err(ConfigError::Validation(
                "storage.records_file and storage.preferences_file must differ".into(),
            ));
        }
        Ok(())
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        let name = &self.extraction.api_key_env;
        match std::env::var(name) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ConfigError::MissingApiKey(name.clone())),
        }
    }
}

/// Extraction service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Base URL, without the `/models/...` suffix.
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Storage locations. File names are relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub records_file: String,
    pub preferences_file: String,
}

impl StorageConfig {
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(&self.records_file)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(&self.preferences_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".cardscan"),
            records_file: "records.json".to_string(),
            preferences_file: "preferences.json".to_string(),
        }
    }
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Stock defaults as a TOML value, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value outright.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize, validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `cardscan.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cardscan configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Extraction service
# ---------------------------------------------------------------------------
[extraction]
# Base URL of the generateContent API (no trailing /models/...).
endpoint = "https://generativelanguage.googleapis.com/v1beta"

# Model used for structured extraction.
model = "gemini-2.5-flash"

# Environment variable the API key is read from. The key itself is never
# stored in this file.
api_key_env = "GEMINI_API_KEY"

# Give up on a request after this many seconds.
timeout_secs = 60

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Directory holding the record and preference documents. Created on first
# write.
data_dir = ".cardscan"

# JSON array of contact records, newest first.
records_file = "records.json"

# Auto-save preference.
preferences_file = "preferences.json"
"##
}
