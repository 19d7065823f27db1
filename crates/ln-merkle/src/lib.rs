pub mod error;
pub mod tree;

pub use error::MerkleError;
pub use tree::{verify_proof, MerkleTree};
