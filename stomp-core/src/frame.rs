use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Action of a frame sent to a subscriber carrying a broker message.
pub const MESSAGE_ACTION: &str = "MESSAGE";

/// Header names shared by SUBSCRIBE and MESSAGE frames.
pub mod headers {
    pub const ID: &str = "id";
    pub const SUBSCRIPTION: &str = "subscription";
    // ack mode on SUBSCRIBE, ack id on MESSAGE
    pub const ACK: &str = "ack";
    pub const MESSAGE_ID: &str = "message-id";
    pub const DESTINATION: &str = "destination";
    pub const TRANSFORMATION: &str = "transformation";
}

/// Outgoing STOMP frame. Serialization onto the wire belongs to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StompFrame {
    pub action: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl StompFrame {
    pub fn new(action: &str) -> Self {
        StompFrame {
            action: action.to_string(),
            ..Default::default()
        }
    }

    pub fn set_action(&mut self, action: &str) {
        self.action = action.to_string();
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_string(), value.into());
    }
}
