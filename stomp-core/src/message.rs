use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::errors::CoreError;

/// Property carrying the name of the transformation the subscriber asked for.
pub const TRANSFORMATION_PROPERTY: &str = "transformation";

// The MessageId is assigned by the broker when the producer's message is accepted.
// Its textual form travels to the subscriber in the `message-id` header and comes
// back verbatim in ACK / NACK frames, so parsing it back must be lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    // Identifies the producer, everything before the last ':' of the textual form
    pub producer_id: String,
    // Sequence number of the message within the producer
    pub producer_sequence: u64,
}

impl MessageId {
    pub fn new(producer_id: impl Into<String>, producer_sequence: u64) -> Self {
        MessageId {
            producer_id: producer_id.into(),
            producer_sequence,
        }
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.producer_id, self.producer_sequence)
    }
}

impl FromStr for MessageId {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (producer_id, sequence) = value
            .rsplit_once(':')
            .ok_or_else(|| CoreError::MalformedMessageId(value.to_string()))?;

        if producer_id.is_empty() {
            return Err(CoreError::MalformedMessageId(value.to_string()));
        }

        let producer_sequence = sequence
            .parse::<u64>()
            .map_err(|_| CoreError::MalformedMessageId(value.to_string()))?;

        Ok(MessageId::new(producer_id, producer_sequence))
    }
}

/// Broker-side identity of a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumerId {
    pub connection_id: String,
    pub session_id: u64,
    pub value: u64,
}

impl Display for ConsumerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.connection_id, self.session_id, self.value)
    }
}

/// The consumer registered on the broker on behalf of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerInfo {
    pub consumer_id: ConsumerId,
    // broker destination the consumer reads from, e.g. `queue://orders`
    pub destination: String,
}

/// Body kind of a broker message. Only `Bytes` matters to the ack engine,
/// transformations are never requested for binary bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Text,
    Bytes,
    Map,
    Object,
    Stream,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub destination: String,
    pub body_kind: BodyKind,
    pub payload: Vec<u8>,
    // String properties, the STOMP headers of the outgoing MESSAGE frame are derived from them
    pub properties: HashMap<String, String>,
    pub redelivery_counter: u32,
}

impl Message {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }
}

/// A message handed to a consumer by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDispatch {
    pub consumer_id: ConsumerId,
    pub destination: String,
    pub message: Message,
}

impl MessageDispatch {
    pub fn message_id(&self) -> &MessageId {
        &self.message.message_id
    }
}
