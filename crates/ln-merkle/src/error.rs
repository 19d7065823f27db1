use thiserror::Error;

#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("tree has no leaves")]
    Empty,

    #[error("leaf index out of bounds")]
    NotFound,
}
