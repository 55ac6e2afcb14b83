//! Relay metrics.
//!
//! # Metrics
//! - `ntlm_relay_requests_total` (counter): relayed requests by outcome
//! - `ntlm_relay_round_trips_total` (counter): upstream round trips
//! - `ntlm_relay_challenges_total` (counter): NTLM challenges received
//! - `ntlm_relay_sessions_created_total` (counter): host sessions built
//! - `ntlm_relay_cached_sessions` (gauge): current session cache size
//!
//! The library only records; installing an exporter is up to the host.

use metrics::{counter, gauge};

/// Terminal outcome of a relayed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream answered with something other than an NTLM challenge.
    Success,
    /// Retries ran out while the upstream kept challenging.
    Exhausted,
    /// Local 407 after a transport or construction failure.
    Failed,
    /// Caller cancelled mid-flight.
    Cancelled,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Exhausted => "exhausted",
            Outcome::Failed => "failed",
            Outcome::Cancelled => "cancelled",
        }
    }
}

pub fn record_outcome(outcome: Outcome) {
    counter!("ntlm_relay_requests_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_round_trip() {
    counter!("ntlm_relay_round_trips_total").increment(1);
}

pub fn record_challenge() {
    counter!("ntlm_relay_challenges_total").increment(1);
}

pub fn record_session_created(cache_size: usize) {
    counter!("ntlm_relay_sessions_created_total").increment(1);
    record_cache_size(cache_size);
}

pub fn record_cache_size(size: usize) {
    gauge!("ntlm_relay_cached_sessions").set(size as f64);
}
