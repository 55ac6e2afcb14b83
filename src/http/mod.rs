//! HTTP message handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (from the proxy engine)
//!     → request.rs (request ID for the relay span)
//!     → replay.rs (buffer body, absolute target, independent copy)
//!     → one OutboundRequest per attempt
//!
//! No usable upstream response
//!     → response.rs (407 "NTLM Authentication Failed")
//! ```

pub mod replay;
pub mod request;
pub mod response;

pub use replay::ReplayableRequest;
pub use request::{request_id, X_REQUEST_ID};
pub use response::{failure_response, full_body, FAILURE_BODY};
