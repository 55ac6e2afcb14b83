//! NTLM relay subsystem.
//!
//! # Data Flow
//! ```text
//! Engine hook (RequestHook::on_request)
//!     → entrypoint.rs (engagement policy, span, outcome → response)
//!     → retry.rs (buffer request, send via cached client, detect, retry)
//!         → SessionCache::get_or_create(host)
//!         → ChallengeDetector after each round trip
//!     → RelayOutcome::Respond(response) | RelayOutcome::Forward(request)
//! ```
//!
//! # Design Decisions
//! - Every outcome resolves to a response; 407 only when no upstream
//!   response exists
//! - The relay runs on the caller's task; it spawns nothing

pub mod context;
pub mod entrypoint;
pub mod retry;

pub use context::{CancelHandle, Cancellation, ProxyContext};
pub use entrypoint::{NtlmRelay, RelayOutcome, RequestHook};
pub use retry::{RetryController, RetryOutcome, Terminal};
