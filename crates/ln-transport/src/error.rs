use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("message exceeded the maximum allowed size")]
    MessageTooLarge,

    #[error("peer did not respond in time")]
    Timeout,

    #[error("socket closed by peer")]
    SocketClosed,

    #[error("malformed message header")]
    InvalidHeader,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
