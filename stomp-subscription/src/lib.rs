mod ack_mode;
mod ack_tracker;
mod bridge;
mod errors;
mod ledger;
mod registry;
mod subscription_options;
mod tracker_metrics;

#[cfg(test)]
mod test_utils;

pub use ack_mode::AckMode;
pub use ack_tracker::AckTracker;
pub use bridge::{BridgeError, ProtocolBridge, TransactionListener};
pub use errors::{Result, SubscriptionError};
pub use registry::SubscriptionRegistry;
pub use subscription_options::SubscriptionOptions;
pub use tracker_metrics::register_metrics;
