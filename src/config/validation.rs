//! Configuration validation.
//!
//! Serde handles syntax; this pass checks values. Every problem is reported,
//! not just the first one.

use thiserror::Error;

use crate::config::schema::RelayConfig;

/// Upper bound on `credentials.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 32;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("credentials.username must not be empty")]
    EmptyUsername,

    #[error("credentials.password must not be empty")]
    EmptyPassword,

    #[error("credentials.max_retries is {0}, must be at most {max}", max = MAX_RETRIES_LIMIT)]
    TooManyRetries(u32),

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("relay.idle_timeout_secs must be greater than zero when set")]
    ZeroIdleTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.credentials.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    }
    if config.credentials.password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    }
    if config.credentials.max_retries > MAX_RETRIES_LIMIT {
        errors.push(ValidationError::TooManyRetries(config.credentials.max_retries));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.relay.idle_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroIdleTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RelayConfig {
        let mut config = RelayConfig::default();
        config.credentials.username = "svc-proxy".into();
        config.credentials.password = "hunter2".into();
        config
    }

    #[test]
    fn accepts_minimal_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn empty_domain_is_allowed() {
        let config = valid();
        assert!(config.credentials.domain.is_empty());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn reports_every_error() {
        let mut config = RelayConfig::default();
        config.credentials.max_retries = 100;
        config.limits.max_body_bytes = 0;
        config.relay.idle_timeout_secs = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyUsername,
                ValidationError::EmptyPassword,
                ValidationError::TooManyRetries(100),
                ValidationError::ZeroBodyLimit,
                ValidationError::ZeroIdleTimeout,
            ]
        );
    }

    #[test]
    fn retry_error_names_the_limit() {
        assert_eq!(
            ValidationError::TooManyRetries(100).to_string(),
            "credentials.max_retries is 100, must be at most 32"
        );
    }
}
