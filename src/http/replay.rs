//! Replayable copies of inbound requests.
//!
//! # Responsibilities
//! - Drain and buffer the inbound body once, so every attempt sends the same bytes
//! - Copy method, target and headers into a value independent of the original
//! - Turn origin-form targets into absolute URIs the outbound client accepts
//! - Reject requests that cannot be replayed before any round trip happens
//!
//! # Design Decisions
//! - Server-side state is not carried: extensions (connection info, upgrade
//!   handles) and the inbound protocol version stay behind. Forwarding an
//!   HTTP/2 version marker to an HTTP/1 upstream fails locally in the client.
//! - The buffered body is `Bytes`, so per-attempt copies are reference bumps
//! - Userinfo in the target never becomes part of the host key

use std::fmt;

use bytes::{Bytes, BytesMut};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderMap, HOST};
use hyper::http::uri::{Authority, Scheme};
use hyper::{Method, Request, Uri};

use crate::error::{RelayError, Result};
use crate::transport::OutboundRequest;

/// A fully buffered request that can be sent any number of times.
#[derive(Debug, Clone)]
pub struct ReplayableRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    host: String,
    body: Bytes,
}

impl ReplayableRequest {
    /// Consume `request`, buffering at most `body_limit` body bytes.
    pub async fn from_request<B>(request: Request<B>, body_limit: usize) -> Result<Self>
    where
        B: Body<Data = Bytes>,
        B::Error: fmt::Display,
    {
        let (parts, body) = request.into_parts();

        if parts.method == Method::CONNECT {
            return Err(RelayError::construction("CONNECT tunnels cannot be replayed"));
        }

        let authority = target_authority(&parts.uri, &parts.headers)?;
        let uri = absolute_uri(&parts.uri, &authority)?;

        let body = buffer_body(body, body_limit).await?;

        let replay = Self {
            method: parts.method,
            uri,
            headers: parts.headers,
            host: authority.as_str().to_ascii_lowercase(),
            body,
        };

        // Surface builder errors now rather than on the first attempt.
        replay.to_request()?;
        Ok(replay)
    }

    /// Build a fresh outbound request for one attempt.
    pub fn to_request(&self) -> Result<OutboundRequest> {
        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(self.uri.clone())
            .body(Full::new(self.body.clone()))
            .map_err(|e| RelayError::construction(format!("invalid request: {}", e)))?;
        *request.headers_mut() = self.headers.clone();
        Ok(request)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Lower-cased `host[:port]` of the upstream; the session cache key.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Drain `body` into one buffer, failing once it grows past `limit` bytes.
async fn buffer_body<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut buffered = BytesMut::new();

    while let Some(frame) = body.frame().await {
        let frame = frame
            .map_err(|e| RelayError::construction(format!("failed to buffer request body: {}", e)))?;
        // Trailers are not replayed.
        if let Ok(data) = frame.into_data() {
            if buffered.len() + data.len() > limit {
                return Err(RelayError::construction(format!(
                    "request body exceeds {} bytes",
                    limit
                )));
            }
            buffered.extend_from_slice(&data);
        }
    }

    Ok(buffered.freeze())
}

/// Where the request is going: the URI authority, else the `Host` header.
///
/// Any `user:password@` prefix is dropped.
pub fn target_authority(uri: &Uri, headers: &HeaderMap) -> Result<Authority> {
    if let Some(authority) = uri.authority() {
        return without_userinfo(authority);
    }

    let host = headers
        .get(HOST)
        .ok_or_else(|| RelayError::construction("request has no target host"))?;
    let host = host
        .to_str()
        .map_err(|_| RelayError::construction("Host header is not valid ASCII"))?;
    host.parse::<Authority>()
        .map_err(|e| RelayError::construction(format!("invalid Host header {:?}: {}", host, e)))
}

fn without_userinfo(authority: &Authority) -> Result<Authority> {
    match authority.as_str().rsplit_once('@') {
        Some((_, host)) => host
            .parse::<Authority>()
            .map_err(|e| RelayError::construction(format!("invalid request authority: {}", e))),
        None => Ok(authority.clone()),
    }
}

fn absolute_uri(uri: &Uri, authority: &Authority) -> Result<Uri> {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Ok(uri.clone());
    }

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    Uri::builder()
        .scheme(uri.scheme().cloned().unwrap_or(Scheme::HTTP))
        .authority(authority.clone())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| RelayError::construction(format!("invalid request target: {}", e)))
}
