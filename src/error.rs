//! Error types for the relay.
//!
//! Only two kinds of failure are fatal for a relayed request: a malformed
//! inbound request that cannot be replayed, and a transport failure while a
//! round trip was in flight. NTLM challenges are not errors; they drive the
//! retry loop in [`crate::relay::retry`].

use thiserror::Error;

/// Boxed error used at the transport seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not establish a connection to the upstream.
    #[error("connection failed: {0}")]
    Connect(#[source] BoxError),

    /// The connection broke while the exchange was in progress.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the request (client gone, deadline exceeded).
    #[error("round trip cancelled")]
    Cancelled,

    /// Anything else reported by the underlying client.
    #[error("transport error: {0}")]
    Other(#[source] BoxError),
}

impl TransportError {
    /// True when the failure came from cancellation rather than the network.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

/// Relay error type.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbound request could not be turned into a replayable request.
    #[error("cannot replay request: {0}")]
    Construction(String),

    /// The round trip failed before any usable response existed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RelayError {
    pub(crate) fn construction(msg: impl Into<String>) -> Self {
        RelayError::Construction(msg.into())
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Construction(_) => "construction",
            RelayError::Transport(TransportError::Cancelled) => "cancelled",
            RelayError::Transport(_) => "transport",
        }
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
