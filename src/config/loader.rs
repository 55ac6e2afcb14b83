//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable consulted when the file carries no password.
pub const PASSWORD_ENV: &str = "NTLM_RELAY_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config_with(&content, |key| std::env::var(key).ok())?;

    tracing::info!(
        path = %path.display(),
        domain = %config.credentials.domain,
        username = %config.credentials.username,
        max_retries = config.credentials.max_retries,
        engage = ?config.relay.engage,
        "Configuration loaded"
    );
    Ok(config)
}

/// Parse and validate configuration from a TOML string, without consulting
/// the environment.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    parse_config_with(content, |_| None)
}

fn parse_config_with<F>(content: &str, env: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: RelayConfig = toml::from_str(content)?;

    if config.credentials.password.is_empty() {
        if let Some(password) = env(PASSWORD_ENV) {
            config.credentials.password = password;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
