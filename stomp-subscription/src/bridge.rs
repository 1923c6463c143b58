use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use stomp_core::{
    ack::AckCommand,
    frame::StompFrame,
    message::{Message, MessageId},
    transaction::TransactionId,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("unable to convert message: {0}")]
    Conversion(String),

    #[error("subscriber connection is closed")]
    SubscriberClosed,

    #[error("broker connection is closed")]
    BrokerClosed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// The protocol converter side of the bridge. Shared by every subscription
/// of a connection, implementations must not keep per-subscription state.
#[async_trait]
pub trait ProtocolBridge: Send + Sync + Debug {
    /// Converts a broker message into a STOMP frame.
    fn convert_message(
        &self,
        message: &Message,
        ignore_transformation: bool,
    ) -> Result<StompFrame, BridgeError>;

    async fn send_to_subscriber(&self, frame: StompFrame) -> Result<(), BridgeError>;

    async fn send_to_broker(&self, ack: AckCommand) -> Result<(), BridgeError>;

    /// Called with the ids a client-mode ack finally removed.
    async fn after_client_ack(&self, subscription_id: Option<&str>, acknowledged: &[MessageId]);
}

/// Receives the outcome of a transaction from the transaction coordinator.
#[async_trait]
pub trait TransactionListener: Send + Sync {
    async fn on_commit(&self, transaction_id: &TransactionId) -> crate::Result<()>;

    async fn on_abort(&self, transaction_id: &TransactionId) -> crate::Result<()>;
}
