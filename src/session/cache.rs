//! Per-host cache of NTLM-authenticated clients.
//!
//! # Responsibilities
//! - Hand every request for a host the same authenticating client
//! - Build that client lazily on first contact
//! - Optionally drop clients that sat idle too long
//!
//! # Design Decisions
//! - Get-or-create is a single DashMap entry operation: the client is built
//!   while the shard lock is held, so two cold requests for one host can never
//!   both construct a transport
//! - No public remove/refresh; entries live as long as the cache unless idle
//!   eviction is enabled
//! - Eviction skips entries whose client is still leased by a request

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::auth::CredentialSet;
use crate::observability::metrics;
use crate::transport::{AuthenticatedClient, NtlmConnector, Transport};

struct Session {
    client: Arc<AuthenticatedClient>,
    last_used: Instant,
}

impl Session {
    /// Idle and not held by any in-flight request.
    fn evictable(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.duration_since(self.last_used) >= idle_timeout && Arc::strong_count(&self.client) == 1
    }
}

/// Concurrency-safe map from upstream host to its authenticated client.
pub struct SessionCache {
    sessions: DashMap<String, Session>,
    connector: Arc<dyn NtlmConnector>,
    idle_timeout: Option<Duration>,
    /// Reference point for `next_sweep_ms`.
    epoch: Instant,
    next_sweep_ms: AtomicU64,
}

impl SessionCache {
    /// Create an empty cache that builds clients with `connector`.
    pub fn new(connector: Arc<dyn NtlmConnector>) -> Self {
        Self {
            sessions: DashMap::new(),
            connector,
            idle_timeout: None,
            epoch: Instant::now(),
            next_sweep_ms: AtomicU64::new(0),
        }
    }

    /// Enable idle eviction.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    /// Return the client for `host`, creating it from `base` on first use.
    pub fn get_or_create(
        &self,
        host: &str,
        base: Arc<dyn Transport>,
        credentials: &CredentialSet,
    ) -> Arc<AuthenticatedClient> {
        let key = host_key(host);
        let now = Instant::now();
        self.maybe_sweep(now);

        let mut created = false;
        let client = {
            let mut session = self.sessions.entry(key.clone()).or_insert_with(|| {
                created = true;
                tracing::info!(host = %key, "Creating NTLM session");
                Session {
                    client: Arc::new(AuthenticatedClient::connect(
                        self.connector.as_ref(),
                        base,
                        credentials,
                    )),
                    last_used: now,
                }
            });
            session.last_used = now;
            session.client.clone()
        };

        if created {
            metrics::record_session_created(self.sessions.len());
        } else {
            tracing::debug!(host = %key, "Using cached NTLM session");
        }
        client
    }

    /// Number of cached hosts.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Whether a session exists for `host`.
    pub fn contains(&self, host: &str) -> bool {
        self.sessions.contains_key(&host_key(host))
    }

    /// Sweep at most once per idle period.
    fn maybe_sweep(&self, now: Instant) {
        let Some(idle_timeout) = self.idle_timeout else {
            return;
        };

        let now_ms = now.saturating_duration_since(self.epoch).as_millis() as u64;
        let due = self.next_sweep_ms.load(Ordering::Relaxed);
        if now_ms < due {
            return;
        }
        let next = now_ms.saturating_add(idle_timeout.as_millis() as u64);
        if self
            .next_sweep_ms
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            // Another request is sweeping.
            return;
        }

        self.evict_idle(now, idle_timeout);
    }

    fn evict_idle(&self, now: Instant, idle_timeout: Duration) {
        let before = self.sessions.len();
        self.sessions.retain(|host, session| {
            let evict = session.evictable(now, idle_timeout);
            if evict {
                tracing::info!(host = %host, "Evicting idle NTLM session");
            }
            !evict
        });
        let after = self.sessions.len();
        if after != before {
            metrics::record_cache_size(after);
        }
    }
}

/// Lower-cased `host[:port]` with any `user:password@` prefix removed.
fn host_key(host: &str) -> String {
    let host = host.rsplit_once('@').map_or(host, |(_, host)| host);
    host.to_ascii_lowercase()
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("sessions", &self.sessions.len())
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
