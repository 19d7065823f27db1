//! The node: keypair, chain, mempool, and peer table behind a request
//! router, plus the length-prefixed listener binary that hosts it.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod mempool;
pub mod node;
pub mod router;

pub use config::NodeConfig;
pub use error::NodeError;
pub use mempool::Mempool;
pub use node::Node;
pub use router::{dispatch, RequestEnvelope, ResponseEnvelope};
