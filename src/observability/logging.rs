//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level when set
//! - JSON format for production, pretty format for development

use tracing::subscriber::SetGlobalDefaultError;
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the filter: environment first, then the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Build the subscriber described by `config` without installing it.
pub fn build_subscriber(config: &ObservabilityConfig) -> Box<dyn Subscriber + Send + Sync> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    if config.json_logs {
        Box::new(registry.with(tracing_subscriber::fmt::layer().json()))
    } else {
        Box::new(registry.with(tracing_subscriber::fmt::layer()))
    }
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set, so hosts that configure
/// tracing themselves can simply skip this.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), SetGlobalDefaultError> {
    tracing::subscriber::set_global_default(build_subscriber(config))
}
