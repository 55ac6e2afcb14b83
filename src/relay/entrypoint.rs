//! Relay entrypoint invoked by the proxy engine.
//!
//! # Responsibilities
//! - Decide whether a request is relayed at all (engagement policy)
//! - Run relayed requests through the retry loop inside a tracing span
//! - Turn every outcome into a concrete response; nothing escapes as an error
//! - Learn which hosts challenge for NTLM from responses the engine reports

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use hyper::body::Body;
use hyper::header::{AUTHORIZATION, PROXY_AUTHORIZATION};
use hyper::{Request, Response};
use tracing::Instrument;

use crate::auth::challenge::names_ntlm_scheme;
use crate::auth::{is_challenge, CredentialSet};
use crate::config::{EngagePolicy, RelayConfig};
use crate::http::replay::target_authority;
use crate::http::request_id;
use crate::observability::metrics::{self, Outcome};
use crate::relay::context::ProxyContext;
use crate::relay::retry::{RetryController, Terminal};
use crate::session::SessionCache;
use crate::transport::{NtlmConnector, RelayBody};

/// What the engine should do with an intercepted request.
#[derive(Debug)]
pub enum RelayOutcome<B> {
    /// Not handled; continue the normal pipeline with the untouched request.
    Forward(Request<B>),
    /// Final answer for the downstream client.
    Respond(Response<RelayBody>),
}

impl<B> RelayOutcome<B> {
    pub fn is_forward(&self) -> bool {
        matches!(self, RelayOutcome::Forward(_))
    }

    pub fn into_response(self) -> Option<Response<RelayBody>> {
        match self {
            RelayOutcome::Forward(_) => None,
            RelayOutcome::Respond(response) => Some(response),
        }
    }
}

/// Interception hook as seen by a proxy engine.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Called once per intercepted request.
    async fn on_request(&self, request: Request<RelayBody>, ctx: &ProxyContext) -> RelayOutcome<RelayBody>;

    /// Called with responses to requests the hook forwarded.
    fn on_response(&self, _host: &str, _response: &Response<RelayBody>) {}
}

/// The NTLM relay: credentials, per-host sessions and engagement policy.
pub struct NtlmRelay {
    credentials: Arc<CredentialSet>,
    sessions: SessionCache,
    policy: EngagePolicy,
    body_limit: usize,
    challenged_hosts: DashMap<String, ()>,
}

impl NtlmRelay {
    /// Create a relay that engages on every request.
    pub fn new(credentials: CredentialSet, sessions: SessionCache) -> Self {
        tracing::info!(
            domain = %credentials.domain(),
            username = %credentials.username(),
            max_retries = credentials.max_retries(),
            "NTLM relay initialized"
        );
        Self {
            credentials: Arc::new(credentials),
            sessions,
            policy: EngagePolicy::Always,
            body_limit: crate::config::LimitsConfig::default().max_body_bytes,
            challenged_hosts: DashMap::new(),
        }
    }

    /// Build a relay from validated configuration.
    pub fn from_config(config: &RelayConfig, connector: Arc<dyn NtlmConnector>) -> Self {
        let mut sessions = SessionCache::new(connector);
        if let Some(secs) = config.relay.idle_timeout_secs {
            sessions = sessions.with_idle_timeout(std::time::Duration::from_secs(secs));
        }
        Self::new(CredentialSet::from(&config.credentials), sessions)
            .with_policy(config.relay.engage)
            .with_body_limit(config.limits.max_body_bytes)
    }

    pub fn with_policy(mut self, policy: EngagePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn policy(&self) -> EngagePolicy {
        self.policy
    }

    /// Whether this request should go through the relay.
    pub fn should_engage<B>(&self, request: &Request<B>) -> bool {
        match self.policy {
            EngagePolicy::Always => true,
            EngagePolicy::ClientHint => [AUTHORIZATION, PROXY_AUTHORIZATION].iter().any(|name| {
                request
                    .headers()
                    .get_all(name)
                    .iter()
                    .any(|value| names_ntlm_scheme(value.as_bytes()))
            }),
            EngagePolicy::ObservedChallenge => target_authority(request.uri(), request.headers())
                .map(|authority| self.has_challenged(authority.as_str()))
                .unwrap_or(false),
        }
    }

    /// Record that `host` answered with an NTLM challenge, if it did.
    pub fn observe_response<B>(&self, host: &str, response: &Response<B>) {
        if !is_challenge(response) {
            return;
        }
        let key = host.to_ascii_lowercase();
        if self.challenged_hosts.insert(key, ()).is_none() {
            tracing::info!(host = %host, "Host requires NTLM, relaying from now on");
        }
    }

    /// Whether `host` has been seen issuing an NTLM challenge.
    pub fn has_challenged(&self, host: &str) -> bool {
        self.challenged_hosts.contains_key(&host.to_ascii_lowercase())
    }

    /// Handle one intercepted request.
    pub async fn handle<B>(&self, request: Request<B>, ctx: &ProxyContext) -> RelayOutcome<B>
    where
        B: Body<Data = Bytes>,
        B::Error: fmt::Display,
    {
        let host = target_authority(request.uri(), request.headers())
            .map(|authority| authority.as_str().to_ascii_lowercase())
            .unwrap_or_default();

        if !self.should_engage(&request) {
            tracing::trace!(host = %host, path = %request.uri().path(), "NTLM relay not engaged");
            return RelayOutcome::Forward(request);
        }

        let span = tracing::info_span!(
            "ntlm_relay",
            request_id = %request_id(request.headers()),
            method = %request.method(),
            host = %host,
            path = %request.uri().path(),
        );

        async move {
            tracing::debug!("Entering NTLM authentication flow");
            let controller = RetryController::new(&self.sessions, &self.credentials, self.body_limit);
            let outcome = controller.run(request, ctx).await;

            let kind = outcome.outcome();
            metrics::record_outcome(kind);
            match (&outcome.terminal, kind) {
                (Terminal::Failed(e), Outcome::Failed) => {
                    tracing::warn!(error = %e, kind = e.kind(), attempts = outcome.attempts, "Answering with 407");
                }
                (_, kind) => {
                    tracing::debug!(outcome = kind.as_str(), attempts = outcome.attempts, "Relay finished");
                }
            }
            RelayOutcome::Respond(outcome.into_response())
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for NtlmRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NtlmRelay")
            .field("credentials", &self.credentials)
            .field("sessions", &self.sessions)
            .field("policy", &self.policy)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestHook for NtlmRelay {
    async fn on_request(&self, request: Request<RelayBody>, ctx: &ProxyContext) -> RelayOutcome<RelayBody> {
        self.handle(request, ctx).await
    }

    fn on_response(&self, host: &str, response: &Response<RelayBody>) {
        self.observe_response(host, response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::http::{full_body, FAILURE_BODY};
    use crate::transport::{OutboundRequest, Transport};
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Answers 200 to everything and counts calls.
    #[derive(Default)]
    struct Upstream {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl Transport for Upstream {
        async fn round_trip(&self, _request: OutboundRequest) -> Result<Response<RelayBody>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "reset",
                )));
            }
            Ok(Response::new(full_body("ok")))
        }
    }

    fn relay(policy: EngagePolicy) -> NtlmRelay {
        let connector = |base: Arc<dyn Transport>, _: &CredentialSet| base;
        NtlmRelay::new(
            CredentialSet::new("CORP", "alice", "pw", 2),
            SessionCache::new(Arc::new(connector)),
        )
        .with_policy(policy)
    }

    fn get(uri: &str) -> Request<RelayBody> {
        Request::builder().uri(uri).body(full_body("")).unwrap()
    }

    fn challenge() -> Response<RelayBody> {
        Response::builder()
            .status(401)
            .header("www-authenticate", "NTLM")
            .body(full_body(""))
            .unwrap()
    }

    #[tokio::test]
    async fn always_policy_relays() {
        let upstream = Arc::new(Upstream::default());
        let ctx = ProxyContext::new(upstream.clone());
        let relay = relay(EngagePolicy::Always);

        let outcome = relay.handle(get("http://intranet.corp/"), &ctx).await;
        let response = outcome.into_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
        assert!(relay.sessions().contains("intranet.corp"));
    }

    #[tokio::test]
    async fn client_hint_policy_forwards_plain_requests() {
        let upstream = Arc::new(Upstream::default());
        let ctx = ProxyContext::new(upstream.clone());
        let relay = relay(EngagePolicy::ClientHint);

        let outcome = relay.handle(get("http://intranet.corp/"), &ctx).await;
        assert!(outcome.is_forward());
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);

        let hinted = Request::builder()
            .uri("http://intranet.corp/")
            .header("proxy-authorization", "NTLM TlRMTVNTUAABAAAA")
            .body(full_body(""))
            .unwrap();
        let outcome = relay.handle(hinted, &ctx).await;
        assert!(!outcome.is_forward());
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn forwarded_request_is_untouched() {
        let upstream = Arc::new(Upstream::default());
        let ctx = ProxyContext::new(upstream.clone());
        let relay = relay(EngagePolicy::ObservedChallenge);

        let request = Request::builder()
            .method("PUT")
            .uri("http://intranet.corp/doc")
            .header("x-custom", "1")
            .body(full_body("document"))
            .unwrap();
        match relay.handle(request, &ctx).await {
            RelayOutcome::Forward(request) => {
                assert_eq!(request.method(), "PUT");
                assert_eq!(request.headers()["x-custom"], "1");
                let body = request.into_body().collect().await.unwrap().to_bytes();
                assert_eq!(body.as_ref(), b"document");
            }
            RelayOutcome::Respond(_) => panic!("request should have been forwarded"),
        }
    }

    #[tokio::test]
    async fn observed_challenge_policy_learns_hosts() {
        let upstream = Arc::new(Upstream::default());
        let ctx = ProxyContext::new(upstream.clone());
        let relay = relay(EngagePolicy::ObservedChallenge);

        assert!(relay.handle(get("http://intranet.corp/"), &ctx).await.is_forward());

        relay.observe_response("intranet.corp", &Response::new(full_body("fine")));
        assert!(!relay.has_challenged("intranet.corp"));

        relay.on_response("Intranet.Corp", &challenge());
        assert!(relay.has_challenged("intranet.corp"));

        assert!(!relay.handle(get("http://intranet.corp/"), &ctx).await.is_forward());
        assert!(relay.handle(get("http://other.corp/"), &ctx).await.is_forward());
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_becomes_407() {
        let upstream = Arc::new(Upstream {
            calls: AtomicU32::new(0),
            fail: true,
        });
        let ctx = ProxyContext::new(upstream.clone());
        let hook: Arc<dyn RequestHook> = Arc::new(relay(EngagePolicy::Always));

        let response = hook
            .on_request(get("http://intranet.corp/"), &ctx)
            .await
            .into_response()
            .unwrap();
        assert_eq!(response.status(), StatusCode::PROXY_AUTHENTICATION_REQUIRED);
        assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), FAILURE_BODY.as_bytes());
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn built_from_config() {
        let mut config = RelayConfig::default();
        config.credentials.username = "svc".into();
        config.credentials.password = "pw".into();
        config.credentials.max_retries = 4;
        config.relay.engage = EngagePolicy::ClientHint;
        config.limits.max_body_bytes = 512;

        let connector = |base: Arc<dyn Transport>, _: &CredentialSet| base;
        let relay = NtlmRelay::from_config(&config, Arc::new(connector));
        assert_eq!(relay.policy(), EngagePolicy::ClientHint);
        assert_eq!(relay.credentials().max_retries(), 4);
        assert!(relay.sessions().is_empty());
        assert!(!format!("{:?}", relay).contains("\"pw\""));
    }
}
