//! Length-prefixed TCP framing and peer bookkeeping.
//!
//! This crate knows nothing about the request/response payloads it carries
//! — that vocabulary lives in `ln-node`. It only guarantees that whatever
//! bytes go in at one end of a connection come out whole (or not at all) at
//! the other.

pub mod error;
pub mod frame;
pub mod peer;

pub use error::TransportError;
pub use peer::PeerRegistry;
