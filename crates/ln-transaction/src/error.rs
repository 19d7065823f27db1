use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("transaction signature does not verify against its sender")]
    BadTransaction,

    #[error("malformed wire form: {0}")]
    MalformedWireForm(#[from] serde_json::Error),
}
