//! NTLM-capable client handles.
//!
//! # Responsibilities
//! - Define the seam to the external NTLM decorator (`NtlmConnector`)
//! - Wrap the engine's transport once per host into an authenticating client
//!
//! # Design Decisions
//! - Cached clients never time out on their own; overall latency is bounded
//!   by the retry count and caller cancellation

use std::fmt;
use std::sync::Arc;

use crate::auth::CredentialSet;
use crate::error::TransportError;
use crate::transport::{OutboundRequest, RelayBody, Transport};

/// Factory for NTLM-authenticating transports.
///
/// Implementations wrap `base` so that a single `round_trip` performs the
/// whole Negotiate/Challenge/Authenticate exchange. A 401 that still comes
/// back from such a round trip is handled by the relay's retry loop.
pub trait NtlmConnector: Send + Sync {
    fn connect(&self, base: Arc<dyn Transport>, credentials: &CredentialSet) -> Arc<dyn Transport>;
}

impl<F> NtlmConnector for F
where
    F: Fn(Arc<dyn Transport>, &CredentialSet) -> Arc<dyn Transport> + Send + Sync,
{
    fn connect(&self, base: Arc<dyn Transport>, credentials: &CredentialSet) -> Arc<dyn Transport> {
        self(base, credentials)
    }
}

/// An NTLM-authenticating transport as stored in the session cache.
///
/// There is no per-request timeout: the handshake is bound to one upstream
/// connection and cutting it short would sever it mid-way.
pub struct AuthenticatedClient {
    transport: Arc<dyn Transport>,
}

impl AuthenticatedClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a client the way the session cache does.
    pub fn connect(
        connector: &dyn NtlmConnector,
        base: Arc<dyn Transport>,
        credentials: &CredentialSet,
    ) -> Self {
        Self::new(connector.connect(base, credentials))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Perform one round trip through the authenticating transport.
    pub async fn send(
        &self,
        request: OutboundRequest,
    ) -> Result<hyper::Response<RelayBody>, TransportError> {
        self.transport.round_trip(request).await
    }
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient").finish_non_exhaustive()
    }
}
