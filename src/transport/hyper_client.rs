//! Base transport backed by the hyper-util legacy client.
//!
//! Engines that forward plain HTTP with hyper can hand this to the relay as
//! the base transport the NTLM decorator wraps.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::error::{BoxError, TransportError};
use crate::transport::{OutboundRequest, RelayBody, Transport};

/// A `Transport` over a pooled hyper client.
#[derive(Clone, Debug)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperTransport {
    /// Create a transport with a default HTTP connector.
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// Wrap an existing client (e.g. the engine's own).
    pub fn from_client(client: Client<HttpConnector, Full<Bytes>>) -> Self {
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn round_trip(&self, request: OutboundRequest) -> Result<Response<RelayBody>, TransportError> {
        match self.client.request(request).await {
            Ok(response) => Ok(response.map(|body| {
                body.map_err(|e| -> BoxError { Box::new(e) }).boxed_unsync()
            })),
            Err(e) if e.is_connect() => Err(TransportError::Connect(Box::new(e))),
            Err(e) => Err(TransportError::Other(Box::new(e))),
        }
    }
}
