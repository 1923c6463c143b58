use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{trace, warn};

use stomp_core::{
    ack::AckCommand,
    message::{ConsumerInfo, MessageId},
    transaction::TransactionId,
};

use crate::{
    ack_tracker::AckTracker,
    bridge::{ProtocolBridge, TransactionListener},
    errors::{Result, SubscriptionError},
    subscription_options::SubscriptionOptions,
};

#[derive(Debug, Clone, Copy)]
enum AckFrame {
    Ack,
    Nack,
}

/// The subscriptions of one STOMP connection, keyed by subscription id.
///
/// Routes ACK / NACK frames to the tracker owning the message and forwards
/// the resulting command to the broker. Transaction outcomes are fanned out
/// to every tracker, a transaction may span several subscriptions.
#[derive(Debug)]
pub struct SubscriptionRegistry {
    bridge: Arc<dyn ProtocolBridge>,
    trackers: DashMap<String, Arc<AckTracker>>,
}

impl SubscriptionRegistry {
    pub fn new(bridge: Arc<dyn ProtocolBridge>) -> Self {
        SubscriptionRegistry {
            bridge,
            trackers: DashMap::new(),
        }
    }

    /// Builds a tracker sharing this registry's bridge and registers it.
    pub fn subscribe(
        &self,
        options: SubscriptionOptions,
        consumer_info: ConsumerInfo,
    ) -> Arc<AckTracker> {
        let tracker = Arc::new(AckTracker::new(
            options,
            consumer_info,
            Arc::clone(&self.bridge),
        ));
        self.insert(Arc::clone(&tracker));
        tracker
    }

    /// Registers a tracker, returning the one it replaced under the same key.
    pub fn insert(&self, tracker: Arc<AckTracker>) -> Option<Arc<AckTracker>> {
        let replaced = self.trackers.insert(tracker.key().to_string(), tracker);
        if let Some(old) = &replaced {
            warn!(
                "Subscription {} replaced, its pending acknowledgments are dropped",
                old.key()
            );
        }
        replaced
    }

    pub fn remove(&self, subscription_id: &str) -> Option<Arc<AckTracker>> {
        self.trackers.remove(subscription_id).map(|(_, tracker)| tracker)
    }

    pub fn get(&self, subscription_id: &str) -> Option<Arc<AckTracker>> {
        self.trackers
            .get(subscription_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Handles an ACK frame and forwards the resulting command to the broker.
    ///
    /// Without a subscription id (STOMP 1.0) every subscription is asked in turn.
    pub async fn ack(
        &self,
        subscription_id: Option<&str>,
        message_id: &str,
        transaction_id: Option<&TransactionId>,
    ) -> Result<AckCommand> {
        self.route(AckFrame::Ack, subscription_id, message_id, transaction_id)
            .await
    }

    /// Handles a NACK frame and forwards the poison ack to the broker.
    pub async fn nack(
        &self,
        subscription_id: Option<&str>,
        message_id: &str,
        transaction_id: Option<&TransactionId>,
    ) -> Result<AckCommand> {
        self.route(AckFrame::Nack, subscription_id, message_id, transaction_id)
            .await
    }

    async fn route(
        &self,
        frame: AckFrame,
        subscription_id: Option<&str>,
        message_id: &str,
        transaction_id: Option<&TransactionId>,
    ) -> Result<AckCommand> {
        let msg_id: MessageId = message_id.parse()?;

        let candidates = match subscription_id {
            Some(id) => vec![self
                .get(id)
                .ok_or_else(|| SubscriptionError::UnknownSubscription(id.to_string()))?],
            None => self.snapshot(),
        };

        for tracker in candidates {
            let ack = match frame {
                AckFrame::Ack => tracker.ack(&msg_id, transaction_id).await,
                AckFrame::Nack => tracker.nack(&msg_id, transaction_id).await,
            };

            if let Some(ack) = ack {
                trace!(
                    "Forwarding {:?} for {} from subscription {}",
                    frame,
                    msg_id,
                    tracker.key()
                );
                self.bridge.send_to_broker(ack.clone()).await?;
                return Ok(ack);
            }
        }

        Err(SubscriptionError::UnknownMessage(message_id.to_string()))
    }

    // Trackers sorted by key; shard locks are released before any await.
    fn snapshot(&self) -> Vec<Arc<AckTracker>> {
        let mut trackers: Vec<Arc<AckTracker>> = self
            .trackers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        trackers.sort_by(|a, b| a.key().cmp(b.key()));
        trackers
    }
}

#[async_trait]
impl TransactionListener for SubscriptionRegistry {
    /// Commits on every subscription. All of them are visited even if one fails,
    /// the first failure is reported.
    async fn on_commit(&self, transaction_id: &TransactionId) -> Result<()> {
        let mut first_error = None;
        for tracker in self.snapshot() {
            if let Err(e) = tracker.commit(transaction_id).await {
                warn!(
                    "Commit of {} failed on subscription {}: {}",
                    transaction_id,
                    tracker.key(),
                    e
                );
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn on_abort(&self, transaction_id: &TransactionId) -> Result<()> {
        for tracker in self.snapshot() {
            tracker.abort(transaction_id).await;
        }
        Ok(())
    }
}
