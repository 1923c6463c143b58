pub mod ack;
pub mod errors;
pub mod frame;
pub mod message;
pub mod transaction;

pub use errors::CoreError;

#[cfg(test)]
mod tests {
    use super::*;
    use message::MessageId;
    use transaction::TransactionId;

    #[test]
    fn message_id_keeps_colons_in_producer_id() {
        let id: MessageId = "ID:broker-1-4242-1:1:1:1:17".parse().unwrap();
        assert_eq!(id.producer_id, "ID:broker-1-4242-1:1:1:1");
        assert_eq!(id.producer_sequence, 17);
        assert_eq!(id.to_string(), "ID:broker-1-4242-1:1:1:1:17");
    }

    #[test]
    fn message_id_rejects_malformed_values() {
        for bad in ["", "no-sequence", "producer:", ":5", "producer:abc", "producer:-1"] {
            assert_eq!(
                bad.parse::<MessageId>(),
                Err(CoreError::MalformedMessageId(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn transaction_id_parses_broker_form() {
        let tx: TransactionId = "TX:ID:broker-1-4242-1:3".parse().unwrap();
        assert_eq!(tx, TransactionId::new("ID:broker-1-4242-1", 3));
        assert_eq!(tx.to_string(), "TX:ID:broker-1-4242-1:3");

        assert!("ID:broker:3".parse::<TransactionId>().is_err());
        assert!("TX::3".parse::<TransactionId>().is_err());
        assert!("TX:conn:x".parse::<TransactionId>().is_err());
    }
}
