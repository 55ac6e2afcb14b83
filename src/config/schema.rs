//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the NTLM relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// NTLM credentials and retry bound.
    pub credentials: CredentialsConfig,

    /// Relay engagement and session cache settings.
    pub relay: RelayPolicyConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Credentials used for every upstream handshake.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// NT domain (may be empty for local accounts).
    pub domain: String,

    /// Account name.
    pub username: String,

    /// Account password. Falls back to `NTLM_RELAY_PASSWORD` when empty.
    pub password: String,

    /// How many extra round trips to spend on NTLM challenges.
    pub max_retries: u32,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            username: String::new(),
            password: String::new(),
            max_retries: 2,
        }
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// When the relay should take over a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EngagePolicy {
    /// Relay every request.
    #[default]
    Always,
    /// Relay only requests whose client already speaks NTLM
    /// (`Authorization`/`Proxy-Authorization` mentions it).
    ClientHint,
    /// Relay only hosts previously seen issuing an NTLM challenge.
    ObservedChallenge,
}

/// Relay policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayPolicyConfig {
    /// Engagement policy.
    pub engage: EngagePolicy,

    /// Evict cached sessions idle for this many seconds. Disabled when unset.
    pub idle_timeout_secs: Option<u64>,
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size buffered for replay, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
