//! NTLM credentials shared by every relayed request.

use std::fmt;

use crate::config::CredentialsConfig;

/// A password that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain-text password, for handing to the NTLM handshake only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Immutable credential set: who to authenticate as, and how many extra
/// round trips a single request may spend on NTLM challenges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    domain: String,
    username: String,
    password: Password,
    max_retries: u32,
}

impl CredentialSet {
    pub fn new(
        domain: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            domain: domain.into(),
            username: username.into(),
            password: Password::new(password),
            max_retries,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    /// Retries after the first attempt; total round trips are `max_retries + 1`.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl From<&CredentialsConfig> for CredentialSet {
    fn from(config: &CredentialsConfig) -> Self {
        Self::new(
            config.domain.clone(),
            config.username.clone(),
            config.password.clone(),
            config.max_retries,
        )
    }
}
