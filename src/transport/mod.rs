//! Transport seam.
//!
//! # Data Flow
//! ```text
//! ProxyContext.base (engine's own outbound transport)
//!     → NtlmConnector::connect (external NTLM decorator)
//!     → AuthenticatedClient (no per-request timeout)
//!     → cached per host in SessionCache
//!     → round_trip() per relay attempt
//! ```
//!
//! # Design Decisions
//! - Transports are shared behind `Arc<dyn Transport>` so the cache can hand
//!   the same instance to every request for a host
//! - The NTLM handshake lives entirely behind `NtlmConnector`
//! - Response bodies are boxed so any client implementation fits

pub mod client;
pub mod hyper_client;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::Full;

use crate::error::{BoxError, TransportError};

pub use self::client::{AuthenticatedClient, NtlmConnector};
pub use self::hyper_client::HyperTransport;

/// Body type of every response flowing through the relay.
pub type RelayBody = UnsyncBoxBody<Bytes, BoxError>;

/// Request type sent on each attempt; the body is already buffered.
pub type OutboundRequest = hyper::Request<Full<Bytes>>;

/// Something that can perform one HTTP round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(
        &self,
        request: OutboundRequest,
    ) -> Result<hyper::Response<RelayBody>, TransportError>;
}
