//! Application settings loaded from config.toml
//!
//! The file carries the quota policy and the priests to seed into the register on
//! startup. Both sections are optional; a missing `[policy]` table falls back to the
//! default policy (3 personal masses per month).

use crate::core::quota::QuotaPolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Quota and advisory thresholds
    #[serde(default)]
    pub policy: QuotaPolicy,
    /// Priests to seed
    #[serde(default)]
    pub priests: Vec<PriestConfig>,
}

/// Configuration for a single priest
#[derive(Debug, Deserialize, Clone)]
pub struct PriestConfig {
    /// Unique login name
    pub username: String,
    /// Name shown in reports
    pub display_name: String,
    /// Province the priest belongs to
    pub province: String,
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read, the TOML syntax is invalid,
/// or a required field is missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from the default location (./config.toml)
pub fn load_default_config() -> Result<AppConfig> {
    load_config("config.toml")
}
