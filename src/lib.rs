//! NTLM authentication relay for forward proxies.
//!
//! Sits in a proxy's request pipeline and performs NTLM authentication
//! against upstream servers on behalf of clients that just send a plain
//! request. One authenticated client is cached per upstream host; requests
//! are buffered once and replayed until the upstream stops challenging or the
//! retry bound is hit.
//!
//! ```text
//!   engine hook ──▶ relay::NtlmRelay ──▶ relay::RetryController
//!                                           │        │
//!                         session::SessionCache    auth::challenge
//!                                           │
//!                       transport::NtlmConnector (external handshake)
//!                                           │
//!                          engine base transport ──▶ upstream
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod relay;
pub mod session;
pub mod transport;

pub use auth::CredentialSet;
pub use config::RelayConfig;
pub use error::{RelayError, TransportError};
pub use relay::{NtlmRelay, ProxyContext, RelayOutcome, RequestHook};
pub use session::SessionCache;
pub use transport::{NtlmConnector, Transport};
