use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("block exceeds the maximum transaction count")]
    BlockTooLarge,

    #[error("chain is structurally invalid")]
    BadChain,

    #[error("block index {0} not found")]
    BlockNotFound(u64),
}
