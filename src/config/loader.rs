//! Configuration loading from disk and CLI-provided credential material.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::config::schema::WatchConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("--{flag} is not valid base64: {source}")]
    InvalidBase64 {
        flag: &'static str,
        #[source]
        source: base64::DecodeError,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<WatchConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: WatchConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load from `path` if given, otherwise validate the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<WatchConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = WatchConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Decode a required base64 flag value.
pub fn decode_base64_flag(flag: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    STANDARD
        .decode(value.trim())
        .map_err(|source| ConfigError::InvalidBase64 { flag, source })
}

/// Decode an optional base64 flag value. Absent or empty means `None`.
pub fn decode_optional_base64_flag(
    flag: &'static str,
    value: Option<&str>,
) -> Result<Option<Vec<u8>>, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => decode_base64_flag(flag, value).map(Some),
    }
}
