use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use stomp_core::frame::headers;

use crate::ack_mode::AckMode;
use crate::errors::{Result, SubscriptionError};

/// Settings of a single subscription, as requested by the SUBSCRIBE frame
/// or loaded from the bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionOptions {
    /// Subscription id chosen by the client, STOMP 1.0 clients may omit it
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Destination as named by the STOMP client, e.g. `/queue/orders`
    pub destination: String,
    #[serde(default)]
    pub ack_mode: AckMode,
    /// Transformation applied by the bridge to non binary messages
    #[serde(default)]
    pub transformation: Option<String>,
}

impl SubscriptionOptions {
    pub fn new(destination: &str, ack_mode: AckMode) -> Self {
        SubscriptionOptions {
            subscription_id: None,
            destination: destination.to_string(),
            ack_mode,
            transformation: None,
        }
    }

    pub fn with_subscription_id(mut self, subscription_id: &str) -> Self {
        self.subscription_id = Some(subscription_id.to_string());
        self
    }

    pub fn with_transformation(mut self, transformation: &str) -> Self {
        self.transformation = Some(transformation.to_string());
        self
    }

    /// Loads options from a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| SubscriptionError::Config(e.to_string()))
    }
}

/// Builds the options from the headers of a SUBSCRIBE frame.
impl TryFrom<&HashMap<String, String>> for SubscriptionOptions {
    type Error = SubscriptionError;

    fn try_from(subscribe: &HashMap<String, String>) -> Result<Self> {
        let destination = subscribe
            .get(headers::DESTINATION)
            .ok_or(SubscriptionError::MissingHeader(headers::DESTINATION))?;

        let ack_mode = match subscribe.get(headers::ACK) {
            Some(value) => value.parse::<AckMode>()?,
            None => AckMode::default(),
        };

        Ok(SubscriptionOptions {
            subscription_id: subscribe.get(headers::ID).cloned(),
            destination: destination.clone(),
            ack_mode,
            transformation: subscribe.get(headers::TRANSFORMATION).cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn subscribe_headers_map_to_options() {
        let options = SubscriptionOptions::try_from(&headers(&[
            ("id", "sub-0"),
            ("destination", "/queue/orders"),
            ("ack", "client-individual"),
            ("transformation", "jms-map-json"),
        ]))
        .unwrap();

        assert_eq!(options.subscription_id.as_deref(), Some("sub-0"));
        assert_eq!(options.destination, "/queue/orders");
        assert_eq!(options.ack_mode, AckMode::Individual);
        assert_eq!(options.transformation.as_deref(), Some("jms-map-json"));
    }

    #[test]
    fn ack_header_defaults_to_auto() {
        let options =
            SubscriptionOptions::try_from(&headers(&[("destination", "/topic/prices")])).unwrap();
        assert_eq!(options.ack_mode, AckMode::Auto);
        assert!(options.subscription_id.is_none());
    }

    #[test]
    fn rejects_unknown_ack_mode_and_missing_destination() {
        let err = SubscriptionOptions::try_from(&headers(&[
            ("destination", "/queue/a"),
            ("ack", "CLIENT"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidAckMode(v) if v == "CLIENT"));

        let err = SubscriptionOptions::try_from(&headers(&[("ack", "client")])).unwrap_err();
        assert!(matches!(err, SubscriptionError::MissingHeader("destination")));
    }

    #[test]
    fn loads_from_yaml() {
        let options = SubscriptionOptions::from_yaml(
            r#"
subscription_id: audit
destination: /queue/audit
ack_mode: client
"#,
        )
        .unwrap();
        assert_eq!(
            options,
            SubscriptionOptions::new("/queue/audit", AckMode::Client).with_subscription_id("audit")
        );

        let defaulted = SubscriptionOptions::from_yaml("destination: /queue/a").unwrap();
        assert_eq!(defaulted.ack_mode, AckMode::Auto);

        let err = SubscriptionOptions::from_yaml("destination: /queue/a\nack_mode: sometimes")
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::Config(_)));
    }
}
