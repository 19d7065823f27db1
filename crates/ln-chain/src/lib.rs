pub mod account;
pub mod block;
pub mod blockchain;
pub mod config;
pub mod error;

pub use account::{generate_inclusion_proof, verify_inclusion, InclusionProof};
pub use block::Block;
pub use blockchain::Chain;
pub use config::ChainConfig;
pub use error::BlockchainError;
