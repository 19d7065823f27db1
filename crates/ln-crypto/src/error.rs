use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed public key string")]
    InvalidPublicKey,

    #[error("malformed signature string")]
    InvalidSignature,
}
