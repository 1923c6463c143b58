use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::SubscriptionError;

/// How the subscriber acknowledges the messages it receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckMode {
    /// Messages are acknowledged to the broker as soon as they are dispatched.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// An ACK covers the acked message and every message dispatched before it.
    #[serde(rename = "client")]
    Client,
    /// An ACK covers exactly one message.
    #[serde(rename = "client-individual")]
    Individual,
}

impl AckMode {
    /// Value of the `ack` header of a SUBSCRIBE frame.
    pub fn header_value(&self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::Individual => "client-individual",
        }
    }

    /// Whether dispatched messages wait in the ledger for a client acknowledgment.
    pub fn is_tracked(&self) -> bool {
        !matches!(self, AckMode::Auto)
    }
}

impl Display for AckMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header_value())
    }
}

impl FromStr for AckMode {
    type Err = SubscriptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(AckMode::Auto),
            "client" => Ok(AckMode::Client),
            "client-individual" => Ok(AckMode::Individual),
            other => Err(SubscriptionError::InvalidAckMode(other.to_string())),
        }
    }
}
