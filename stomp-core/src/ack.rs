use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::message::{ConsumerId, MessageDispatch, MessageId};
use crate::transaction::TransactionId;

/// Kind of acknowledgment sent to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckType {
    /// Messages are consumed and may be removed by the broker.
    Standard,
    /// Messages were delivered inside a transaction, removal waits for the commit.
    Delivered,
    /// A single message is consumed, earlier ones are left untouched.
    Individual,
    /// The message could not be processed and goes to the dead letter path.
    Poison,
}

impl Display for AckType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AckType::Standard => write!(f, "standard"),
            AckType::Delivered => write!(f, "delivered"),
            AckType::Individual => write!(f, "individual"),
            AckType::Poison => write!(f, "poison"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckCommand {
    pub consumer_id: ConsumerId,
    pub destination: String,
    pub ack_type: AckType,
    // Only set when the command targets exactly one message
    pub first_message_id: Option<MessageId>,
    pub last_message_id: MessageId,
    pub message_count: usize,
    pub transaction_id: Option<TransactionId>,
}

impl AckCommand {
    /// Builds a command covering `message_count` messages ending with the given dispatch.
    pub fn for_dispatch(md: &MessageDispatch, ack_type: AckType, message_count: usize) -> Self {
        AckCommand {
            consumer_id: md.consumer_id.clone(),
            destination: md.destination.clone(),
            ack_type,
            first_message_id: None,
            last_message_id: md.message_id().clone(),
            message_count,
            transaction_id: None,
        }
    }

    /// Builds a command covering exactly `message_id`.
    pub fn for_single(
        consumer_id: ConsumerId,
        destination: String,
        ack_type: AckType,
        message_id: MessageId,
    ) -> Self {
        AckCommand {
            consumer_id,
            destination,
            ack_type,
            first_message_id: Some(message_id.clone()),
            last_message_id: message_id,
            message_count: 1,
            transaction_id: None,
        }
    }

    pub fn with_transaction(mut self, transaction_id: Option<TransactionId>) -> Self {
        self.transaction_id = transaction_id;
        self
    }

    pub fn is_transacted(&self) -> bool {
        self.transaction_id.is_some()
    }
}
