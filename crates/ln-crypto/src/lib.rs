//! Keypair generation, signing and verification.
//!
//! The rest of the workspace treats this crate as an opaque elliptic-curve
//! capability: it never depends on which curve or signature scheme is used,
//! only on hex-encoded public key / signature strings and the `sign`/
//! `verify` operations.

mod error;
mod keypair;

pub use error::CryptoError;
pub use keypair::{is_public_key_string_valid, public_key_from_string, verify, KeyPair};
