//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `rate_limit.requests_per_minute`.
pub const RATE_LIMIT_ENV: &str = "SSN_SERVICE_RATE_LIMIT";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid SSN_SERVICE_RATE_LIMIT value: {0}")]
    Env(String),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Apply the rate limit override from the environment, if present.
pub fn apply_env_overrides(config: &mut ServiceConfig) -> Result<(), ConfigError> {
    apply_rate_limit_override(config, std::env::var(RATE_LIMIT_ENV).ok().as_deref())
}

fn apply_rate_limit_override(
    config: &mut ServiceConfig,
    value: Option<&str>,
) -> Result<(), ConfigError> {
    let Some(raw) = value else {
        return Ok(());
    };
    let limit: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env(raw.to_string()))?;
    config.rate_limit.requests_per_minute = limit;
    validate_config(config).map_err(ConfigError::Validation)
}
