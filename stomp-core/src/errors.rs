use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("malformed message id: {0}")]
    MalformedMessageId(String),

    #[error("malformed transaction id: {0}")]
    MalformedTransactionId(String),
}
