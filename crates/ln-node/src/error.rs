use thiserror::Error;

use ln_chain::BlockchainError;
use ln_transaction::TransactionError;
use ln_transport::TransportError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("transaction rejected: {0}")]
    BadTransaction(#[from] TransactionError),

    #[error("chain rejected: {0}")]
    BadChain(#[from] BlockchainError),

    #[error("peer rejected: not a valid url/address pair")]
    BadPeer,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unknown request path: {0}")]
    UnknownPath(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed request payload: {0}")]
    MalformedRequest(#[from] serde_json::Error),
}
