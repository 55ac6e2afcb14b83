//! Session subsystem.
//!
//! One NTLM-authenticated client per upstream host, shared by every request
//! to that host. NTLM authenticates a connection, not a request, so reusing
//! the client keeps the authenticated connection alive across requests.

pub mod cache;

pub use cache::SessionCache;
