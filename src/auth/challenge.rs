//! NTLM challenge detection.
//!
//! A response is a challenge only when the status is 401 and one of the
//! authentication headers names the NTLM scheme. A bare 401 (or one asking for
//! Basic/Negotiate only) is a real rejection and goes back to the client
//! untouched.

use hyper::header::{HeaderMap, PROXY_AUTHENTICATE, WWW_AUTHENTICATE};
use hyper::{Response, StatusCode};

use crate::error::TransportError;
use crate::transport::RelayBody;

const NTLM_SCHEME: &[u8] = b"ntlm";

/// Outcome of a single round trip as seen by the retry loop.
#[derive(Debug)]
pub enum AttemptResult {
    /// Anything that is not an NTLM challenge, whatever the status.
    Success(Response<RelayBody>),
    /// 401 with an NTLM authentication header.
    Challenge(Response<RelayBody>),
    /// No response was obtained.
    TransportError(TransportError),
}

impl AttemptResult {
    /// Classify the result of a round trip.
    pub fn classify(result: Result<Response<RelayBody>, TransportError>) -> Self {
        match result {
            Ok(response) if is_challenge(&response) => AttemptResult::Challenge(response),
            Ok(response) => AttemptResult::Success(response),
            Err(e) => AttemptResult::TransportError(e),
        }
    }
}

/// Returns true if the response demands (another) NTLM round trip.
pub fn is_challenge<B>(response: &Response<B>) -> bool {
    response.status() == StatusCode::UNAUTHORIZED && offers_ntlm(response.headers())
}

/// True if any `WWW-Authenticate` or `Proxy-Authenticate` value offers NTLM.
pub fn offers_ntlm(headers: &HeaderMap) -> bool {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .chain(headers.get_all(PROXY_AUTHENTICATE).iter())
        .any(|value| names_ntlm_scheme(value.as_bytes()))
}

/// True if one of the comma-separated entries in an authentication header
/// starts with the `NTLM` scheme token. Parameters such as `realm="ntlmgw"`
/// never match.
pub(crate) fn names_ntlm_scheme(value: &[u8]) -> bool {
    value.split(|&b| b == b',').any(|entry| {
        entry
            .split(|b| b.is_ascii_whitespace())
            .find(|token| !token.is_empty())
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case(NTLM_SCHEME))
    })
}
