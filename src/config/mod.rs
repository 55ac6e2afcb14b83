//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env fallback for the password)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → CredentialSet shared via Arc with every relayed request
//! ```
//!
//! # Design Decisions
//! - Config is read once at construction; there is no runtime reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{CredentialsConfig, EngagePolicy, LimitsConfig, ObservabilityConfig, RelayConfig, RelayPolicyConfig};
pub use validation::ValidationError;
