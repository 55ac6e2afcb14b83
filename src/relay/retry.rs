//! Bounded NTLM retry loop.
//!
//! # States
//! ```text
//! Init ──▶ Sent ──▶ Done(success)     non-challenge response, any status
//!           │  ├──▶ Done(failure)     transport error or cancellation
//!           │  └──▶ Done(exhausted)   challenge with no retries left
//!           ▼
//!        Retrying ──▶ Sent            challenge, attempt < max_retries
//! ```
//!
//! # Design Decisions
//! - Only an NTLM challenge is retried; a broken connection is not, since
//!   retrying it would burn the retry budget without reaching the handshake
//! - The host's cached client is re-resolved on each retry, which yields the
//!   same instance; the in-progress handshake state is never discarded
//! - The request is buffered once and every attempt is built from that copy;
//!   cancellation is honored while the body is still being read
//! - After exhausting retries the upstream's last response is returned as-is

use std::fmt;

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Request, Response};

use crate::auth::{AttemptResult, CredentialSet};
use crate::error::{RelayError, TransportError};
use crate::http::{failure_response, ReplayableRequest};
use crate::observability::metrics::{self, Outcome};
use crate::relay::context::ProxyContext;
use crate::session::SessionCache;
use crate::transport::RelayBody;

/// How the retry loop ended.
#[derive(Debug)]
pub enum Terminal {
    /// A response that is not an NTLM challenge.
    Success(Response<RelayBody>),
    /// The last challenge received once retries ran out.
    Exhausted(Response<RelayBody>),
    /// No usable response: construction, transport or cancellation failure.
    Failed(RelayError),
}

/// Result of driving one request through the loop.
#[derive(Debug)]
pub struct RetryOutcome {
    pub terminal: Terminal,
    /// Round trips actually performed.
    pub attempts: u32,
}

impl RetryOutcome {
    pub fn outcome(&self) -> Outcome {
        match &self.terminal {
            Terminal::Success(_) => Outcome::Success,
            Terminal::Exhausted(_) => Outcome::Exhausted,
            Terminal::Failed(RelayError::Transport(TransportError::Cancelled)) => Outcome::Cancelled,
            Terminal::Failed(_) => Outcome::Failed,
        }
    }

    /// The response for the downstream client.
    pub fn into_response(self) -> Response<RelayBody> {
        match self.terminal {
            Terminal::Success(response) | Terminal::Exhausted(response) => response,
            Terminal::Failed(_) => failure_response(),
        }
    }
}

/// Drives a single request through send / detect / retry.
#[derive(Debug)]
pub struct RetryController<'a> {
    sessions: &'a SessionCache,
    credentials: &'a CredentialSet,
    body_limit: usize,
}

impl<'a> RetryController<'a> {
    pub fn new(sessions: &'a SessionCache, credentials: &'a CredentialSet, body_limit: usize) -> Self {
        Self {
            sessions,
            credentials,
            body_limit,
        }
    }

    /// Buffer `request` and run it to a terminal state.
    pub async fn run<B>(&self, request: Request<B>, ctx: &ProxyContext) -> RetryOutcome
    where
        B: Body<Data = Bytes>,
        B::Error: fmt::Display,
    {
        let buffered = tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => Err(RelayError::from(TransportError::Cancelled)),
            replay = ReplayableRequest::from_request(request, self.body_limit) => replay,
        };

        match buffered {
            Ok(replay) => self.drive(&replay, ctx).await,
            Err(RelayError::Transport(e)) => {
                tracing::info!(error = %e, "Relay cancelled while reading the request body");
                RetryOutcome {
                    terminal: Terminal::Failed(e.into()),
                    attempts: 0,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Request cannot be relayed");
                RetryOutcome {
                    terminal: Terminal::Failed(e),
                    attempts: 0,
                }
            }
        }
    }

    /// Send `replay` up to `max_retries + 1` times.
    pub async fn drive(&self, replay: &ReplayableRequest, ctx: &ProxyContext) -> RetryOutcome {
        let host = replay.host();
        let max_retries = self.credentials.max_retries();
        let mut retries = 0u32;
        let mut attempts = 0u32;
        let mut client = self
            .sessions
            .get_or_create(host, ctx.base.clone(), self.credentials);

        loop {
            let request = match replay.to_request() {
                Ok(request) => request,
                Err(e) => {
                    return RetryOutcome {
                        terminal: Terminal::Failed(e),
                        attempts,
                    }
                }
            };

            attempts += 1;
            metrics::record_round_trip();
            let result = tokio::select! {
                biased;
                _ = ctx.cancellation.cancelled() => Err(TransportError::Cancelled),
                result = client.send(request) => result,
            };

            match AttemptResult::classify(result) {
                AttemptResult::Success(response) => {
                    tracing::info!(
                        host = %host,
                        attempt = attempts,
                        status = %response.status(),
                        "Upstream answered"
                    );
                    return RetryOutcome {
                        terminal: Terminal::Success(response),
                        attempts,
                    };
                }
                AttemptResult::TransportError(e) => {
                    if e.is_cancelled() {
                        tracing::info!(host = %host, attempt = attempts, "Relay cancelled by caller");
                    } else {
                        tracing::error!(host = %host, attempt = attempts, error = %e, "Upstream round trip failed");
                    }
                    return RetryOutcome {
                        terminal: Terminal::Failed(e.into()),
                        attempts,
                    };
                }
                AttemptResult::Challenge(response) => {
                    metrics::record_challenge();
                    if retries >= max_retries {
                        tracing::warn!(
                            host = %host,
                            attempts,
                            "NTLM authentication failed, retries exhausted"
                        );
                        return RetryOutcome {
                            terminal: Terminal::Exhausted(response),
                            attempts,
                        };
                    }

                    retries += 1;
                    tracing::warn!(
                        host = %host,
                        attempt = attempts,
                        max_attempts = max_retries.saturating_add(1),
                        "NTLM challenge received, retrying"
                    );
                    drop(response);
                    client = self
                        .sessions
                        .get_or_create(host, ctx.base.clone(), self.credentials);
                }
            }
        }
    }
}
