//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! RelayConfig.credentials
//!     → credentials.rs (CredentialSet, shared read-only)
//!     → handed to the NtlmConnector when a host session is created
//!
//! Upstream response
//!     → challenge.rs (401 + NTLM header?)
//!     → AttemptResult for the retry loop
//! ```

pub mod challenge;
pub mod credentials;

pub use challenge::{is_challenge, AttemptResult};
pub use credentials::{CredentialSet, Password};
