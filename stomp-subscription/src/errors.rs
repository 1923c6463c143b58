use stomp_core::CoreError;
use thiserror::Error;

use crate::bridge::BridgeError;

pub type Result<T> = std::result::Result<T, SubscriptionError>;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("invalid ack mode: {0}")]
    InvalidAckMode(String),

    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("no subscription found with id: {0}")]
    UnknownSubscription(String),

    #[error("unexpected ACK/NACK received for message-id: {0}")]
    UnknownMessage(String),

    #[error("configuration error: {0}")]
    Config(String),
}
