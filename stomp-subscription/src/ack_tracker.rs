use async_trait::async_trait;
use metrics::{counter, gauge};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use stomp_core::{
    ack::{AckCommand, AckType},
    frame::{headers, MESSAGE_ACTION},
    message::{BodyKind, ConsumerInfo, MessageDispatch, MessageId, TRANSFORMATION_PROPERTY},
    transaction::TransactionId,
};

use crate::{
    ack_mode::AckMode,
    bridge::{ProtocolBridge, TransactionListener},
    errors::Result,
    ledger::{DispatchedLedger, PendingTxBuffer},
    subscription_options::SubscriptionOptions,
    tracker_metrics::{
        ACKS_TOTAL, MESSAGES_DISPATCHED_TOTAL, PENDING_MESSAGES, STALE_ACKS_TOTAL,
        TX_ABORTS_TOTAL, TX_COMMITS_TOTAL,
    },
};

/// AckTracker keeps track of what a STOMP subscription has been sent and
/// decides when the broker may consider those messages consumed.
///
/// One tracker exists per subscription and is shared, behind an `Arc`, by the
/// task delivering broker messages and the task processing the client's
/// ACK / NACK / COMMIT / ABORT frames. All mutable state sits behind a single
/// mutex owned by the tracker, so subscriptions never contend with each other.
#[derive(Debug)]
pub struct AckTracker {
    subscription_id: Option<String>,
    consumer_info: ConsumerInfo,
    transformation: Option<String>,
    // label used for logs and metrics, the subscription id or the consumer id
    label: String,
    bridge: Arc<dyn ProtocolBridge>,
    state: Mutex<TrackerState>,
}

#[derive(Debug)]
struct TrackerState {
    ack_mode: AckMode,
    destination: String,
    // sent to the subscriber, not yet finally acknowledged
    dispatched: DispatchedLedger,
    // acknowledged inside a transaction that has not resolved yet
    unconsumed: PendingTxBuffer,
}

impl AckTracker {
    pub fn new(
        options: SubscriptionOptions,
        consumer_info: ConsumerInfo,
        bridge: Arc<dyn ProtocolBridge>,
    ) -> Self {
        let label = options
            .subscription_id
            .clone()
            .unwrap_or_else(|| consumer_info.consumer_id.to_string());

        AckTracker {
            subscription_id: options.subscription_id,
            consumer_info,
            transformation: options.transformation,
            label,
            bridge,
            state: Mutex::new(TrackerState {
                ack_mode: options.ack_mode,
                destination: options.destination,
                dispatched: DispatchedLedger::new(),
                unconsumed: PendingTxBuffer::new(),
            }),
        }
    }

    /// Hands a broker message to the subscriber.
    ///
    /// In client and client-individual mode the dispatch is recorded before the
    /// frame leaves, so an ACK racing right behind the MESSAGE always finds it.
    /// In auto mode the broker gets a standard ack for this single message.
    pub async fn dispatch(&self, md: MessageDispatch, ack_id: Option<&str>) -> Result<()> {
        let auto_ack = {
            let mut state = self.state.lock().await;
            if state.ack_mode.is_tracked() {
                if !state.dispatched.insert(md.clone()) {
                    warn!(
                        "Message {} dispatched again on subscription {}, keeping its position",
                        md.message_id(),
                        self.label
                    );
                }
                self.record_pending(state.dispatched.len());
                None
            } else {
                Some(AckCommand::for_dispatch(&md, AckType::Standard, 1))
            }
        };

        if let Some(ack) = auto_ack {
            trace!("Auto acking message {} on {}", md.message_id(), self.label);
            self.record_ack(ack.ack_type);
            self.bridge.send_to_broker(ack).await?;
        }

        let mut message = md.message;
        let mut ignore_transformation = false;
        match &self.transformation {
            Some(transformation) if message.body_kind != BodyKind::Bytes => {
                message.set_property(TRANSFORMATION_PROPERTY, transformation);
            }
            _ => {
                if message.property(TRANSFORMATION_PROPERTY).is_some() {
                    ignore_transformation = true;
                }
            }
        }

        let mut frame = self
            .bridge
            .convert_message(&message, ignore_transformation)?;
        frame.set_action(MESSAGE_ACTION);
        if let Some(subscription_id) = &self.subscription_id {
            frame.set_header(headers::SUBSCRIPTION, subscription_id.as_str());
        }
        if let Some(ack_id) = ack_id {
            frame.set_header(headers::ACK, ack_id);
        }

        self.bridge.send_to_subscriber(frame).await?;

        counter!(MESSAGES_DISPATCHED_TOTAL.name, "subscription" => self.label.clone())
            .increment(1);
        trace!(
            "Dispatched message {} to subscription {}",
            message.message_id,
            self.label
        );
        Ok(())
    }

    /// Handles an ACK frame.
    ///
    /// Returns the command to forward to the broker, or `None` when the message
    /// is not pending on this subscription (stale or duplicate ack). `None` is
    /// not a failure, nothing must be sent to the broker in that case.
    pub async fn ack(
        &self,
        message_id: &MessageId,
        transaction_id: Option<&TransactionId>,
    ) -> Option<AckCommand> {
        let (ack, acknowledged) = {
            let mut guard = self.state.lock().await;
            if !guard.dispatched.contains(message_id) {
                drop(guard);
                self.record_stale(message_id);
                return None;
            }

            let state = &mut *guard;
            let result = match state.ack_mode {
                AckMode::Client => self.client_ack(state, message_id, transaction_id),
                AckMode::Individual => {
                    let ack = AckCommand::for_single(
                        self.consumer_info.consumer_id.clone(),
                        self.consumer_info.destination.clone(),
                        AckType::Individual,
                        message_id.clone(),
                    );
                    if let Some(tx) = transaction_id {
                        if let Some(md) = state.dispatched.get(message_id) {
                            state.unconsumed.push(md.clone());
                        }
                        (ack.with_transaction(Some(tx.clone())), Vec::new())
                    } else {
                        state.dispatched.remove(message_id);
                        (ack, Vec::new())
                    }
                }
                AckMode::Auto => {
                    // only reachable when the mode was switched with messages in flight
                    warn!(
                        "Ignoring ACK for {} on auto acknowledged subscription {}",
                        message_id, self.label
                    );
                    return None;
                }
            };
            self.record_pending(state.dispatched.len());
            result
        };

        if !acknowledged.is_empty() {
            self.bridge
                .after_client_ack(self.subscription_id.as_deref(), &acknowledged)
                .await;
        }

        self.record_ack(ack.ack_type);
        trace!(
            "Subscription {} acked {} message(s) up to {} ({})",
            self.label,
            ack.message_count,
            ack.last_message_id,
            ack.ack_type
        );
        Some(ack)
    }

    /// Cumulative acknowledgment: everything dispatched up to `message_id` is covered.
    fn client_ack(
        &self,
        state: &mut TrackerState,
        message_id: &MessageId,
        transaction_id: Option<&TransactionId>,
    ) -> (AckCommand, Vec<MessageId>) {
        let (ack_type, count, acknowledged) = match transaction_id {
            None => {
                let removed = state.dispatched.remove_through(message_id);
                let acknowledged: Vec<MessageId> = removed
                    .iter()
                    .map(|md| md.message_id().clone())
                    .collect();
                (AckType::Standard, acknowledged.len(), acknowledged)
            }
            Some(_) => {
                let TrackerState {
                    dispatched,
                    unconsumed,
                    ..
                } = state;
                let mut count = 0;
                for md in dispatched.iter_through(message_id) {
                    if unconsumed.push(md.clone()) {
                        count += 1;
                    }
                }
                (AckType::Delivered, count, Vec::new())
            }
        };

        let ack = AckCommand {
            consumer_id: self.consumer_info.consumer_id.clone(),
            destination: self.consumer_info.destination.clone(),
            ack_type,
            first_message_id: None,
            last_message_id: message_id.clone(),
            message_count: count,
            transaction_id: transaction_id.cloned(),
        };
        (ack, acknowledged)
    }

    /// Handles a NACK frame, the message is poisoned on the broker.
    ///
    /// Unlike an ACK, the message always leaves the ledger, even inside a
    /// transaction: aborting that transaction does not bring it back.
    pub async fn nack(
        &self,
        message_id: &MessageId,
        transaction_id: Option<&TransactionId>,
    ) -> Option<AckCommand> {
        let ack = {
            let mut state = self.state.lock().await;
            let Some(md) = state.dispatched.remove(message_id) else {
                drop(state);
                self.record_stale(message_id);
                return None;
            };

            let mut ack = AckCommand::for_single(
                self.consumer_info.consumer_id.clone(),
                self.consumer_info.destination.clone(),
                AckType::Poison,
                message_id.clone(),
            );
            if let Some(tx) = transaction_id {
                state.unconsumed.push(md);
                ack = ack.with_transaction(Some(tx.clone()));
            }
            self.record_pending(state.dispatched.len());
            ack
        };

        self.record_ack(ack.ack_type);
        debug!("Subscription {} poisoned message {}", self.label, message_id);
        Some(ack)
    }

    /// Applies a committed transaction.
    ///
    /// Messages acked inside the transaction leave the ledger. In client mode a
    /// single standard ack covering all of them is sent to the broker once the
    /// lock is released; client-individual acks were already sent with the
    /// transaction id and the broker applies them itself.
    pub async fn commit(&self, transaction_id: &TransactionId) -> Result<()> {
        let ack = {
            let mut guard = self.state.lock().await;
            let TrackerState {
                ack_mode,
                dispatched,
                unconsumed,
                ..
            } = &mut *guard;

            let swept = dispatched.retain(|md| !unconsumed.contains(md.message_id()));

            let ack = match (*ack_mode, unconsumed.last()) {
                (AckMode::Client, Some(last)) => Some(
                    AckCommand::for_dispatch(last, AckType::Standard, unconsumed.len())
                        .with_transaction(Some(transaction_id.clone())),
                ),
                _ => None,
            };

            unconsumed.clear();
            self.record_pending(dispatched.len());
            debug!(
                "Subscription {} committed {}, {} message(s) left the ledger",
                self.label, transaction_id, swept
            );
            ack
        };

        counter!(TX_COMMITS_TOTAL.name, "subscription" => self.label.clone()).increment(1);

        if let Some(ack) = ack {
            self.record_ack(ack.ack_type);
            self.bridge.send_to_broker(ack).await?;
        }
        Ok(())
    }

    /// Drops the transaction's provisional acks. Messages that were only
    /// buffered are still in the ledger and can be acked again.
    pub async fn abort(&self, transaction_id: &TransactionId) {
        let released = {
            let mut state = self.state.lock().await;
            let released = state.unconsumed.len();
            state.unconsumed.clear();
            released
        };

        counter!(TX_ABORTS_TOTAL.name, "subscription" => self.label.clone()).increment(1);
        debug!(
            "Subscription {} aborted {}, {} provisional ack(s) released",
            self.label, transaction_id, released
        );
    }

    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription_id.as_deref()
    }

    /// Key under which the tracker is registered: the subscription id, or the
    /// consumer id for subscriptions created without one.
    pub fn key(&self) -> &str {
        &self.label
    }

    pub fn consumer_info(&self) -> &ConsumerInfo {
        &self.consumer_info
    }

    pub fn transformation(&self) -> Option<&str> {
        self.transformation.as_deref()
    }

    pub async fn ack_mode(&self) -> AckMode {
        self.state.lock().await.ack_mode
    }

    /// Changes the ack mode. Messages already in the ledger stay there.
    pub async fn set_ack_mode(&self, ack_mode: AckMode) {
        self.state.lock().await.ack_mode = ack_mode;
    }

    pub async fn destination(&self) -> String {
        self.state.lock().await.destination.clone()
    }

    pub async fn set_destination(&self, destination: &str) {
        self.state.lock().await.destination = destination.to_string();
    }

    /// Number of messages awaiting a final acknowledgment.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.dispatched.len()
    }

    /// Number of messages acknowledged inside a transaction that has not resolved.
    pub async fn in_transaction_count(&self) -> usize {
        self.state.lock().await.unconsumed.len()
    }

    /// Ids awaiting a final acknowledgment, oldest dispatch first.
    pub async fn dispatched_ids(&self) -> Vec<MessageId> {
        self.state.lock().await.dispatched.ids()
    }

    fn record_pending(&self, pending: usize) {
        gauge!(PENDING_MESSAGES.name, "subscription" => self.label.clone()).set(pending as f64);
    }

    fn record_ack(&self, ack_type: AckType) {
        counter!(
            ACKS_TOTAL.name,
            "subscription" => self.label.clone(),
            "kind" => ack_type.to_string()
        )
        .increment(1);
    }

    fn record_stale(&self, message_id: &MessageId) {
        counter!(STALE_ACKS_TOTAL.name, "subscription" => self.label.clone()).increment(1);
        trace!(
            "Message {} is not pending on subscription {}, ignoring",
            message_id,
            self.label
        );
    }
}

#[async_trait]
impl TransactionListener for AckTracker {
    async fn on_commit(&self, transaction_id: &TransactionId) -> Result<()> {
        self.commit(transaction_id).await
    }

    async fn on_abort(&self, transaction_id: &TransactionId) -> Result<()> {
        self.abort(transaction_id).await;
        Ok(())
    }
}
