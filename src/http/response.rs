//! Locally synthesized responses.
//!
//! The relay passes upstream responses through untouched; the only response
//! it builds itself is the 407 returned when no usable upstream response
//! exists.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use crate::transport::RelayBody;

/// Body of the local failure response.
pub const FAILURE_BODY: &str = "NTLM Authentication Failed";

/// Plain-text content type used for local responses.
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Wrap buffered bytes as a relay body.
pub fn full_body(bytes: impl Into<Bytes>) -> RelayBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Build a plain-text response with the given status.
pub fn text_response(status: StatusCode, body: &'static str) -> Response<RelayBody> {
    let mut response = Response::new(full_body(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_TEXT));
    response
}

/// The 407 handed to the client after a transport or construction failure.
pub fn failure_response() -> Response<RelayBody> {
    text_response(StatusCode::PROXY_AUTHENTICATION_REQUIRED, FAILURE_BODY)
}
