use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::errors::CoreError;

const TRANSACTION_PREFIX: &str = "TX:";

/// Local transaction started by a STOMP client with BEGIN.
///
/// The textual form is `TX:<connection-id>:<value>`, which is what the
/// broker echoes back in its commit and abort notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub connection_id: String,
    pub value: u64,
}

impl TransactionId {
    pub fn new(connection_id: impl Into<String>, value: u64) -> Self {
        TransactionId {
            connection_id: connection_id.into(),
            value,
        }
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", TRANSACTION_PREFIX, self.connection_id, self.value)
    }
}

impl FromStr for TransactionId {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || CoreError::MalformedTransactionId(value.to_string());

        let rest = value.strip_prefix(TRANSACTION_PREFIX).ok_or_else(malformed)?;
        let (connection_id, tx_value) = rest.rsplit_once(':').ok_or_else(malformed)?;
        if connection_id.is_empty() {
            return Err(malformed());
        }
        let tx_value = tx_value.parse::<u64>().map_err(|_| malformed())?;

        Ok(TransactionId::new(connection_id, tx_value))
    }
}
