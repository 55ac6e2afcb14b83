//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay, session cache, retry loop produce:
//!     → tracing events inside a per-request `ntlm_relay` span
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, fmt or JSON)
//!     → whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the relay span
//! - Passwords never reach a log line

pub mod logging;
pub mod metrics;

pub use logging::{build_subscriber, init_logging};
