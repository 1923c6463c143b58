use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use stomp_core::{
    ack::AckCommand,
    frame::{headers, StompFrame},
    message::{
        BodyKind, ConsumerId, ConsumerInfo, Message, MessageDispatch, MessageId,
        TRANSFORMATION_PROPERTY,
    },
    transaction::TransactionId,
};

use crate::{
    ack_mode::AckMode,
    ack_tracker::AckTracker,
    bridge::{BridgeError, ProtocolBridge},
    subscription_options::SubscriptionOptions,
};

pub(crate) const PRODUCER_ID: &str = "ID:producer-host-4242-1:1:1:1";
pub(crate) const BROKER_DESTINATION: &str = "queue://orders";

/// Conversion request seen by the bridge
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Conversion {
    pub(crate) message_id: MessageId,
    pub(crate) transformation: Option<String>,
    pub(crate) ignore_transformation: bool,
}

/// ProtocolBridge double recording everything the tracker hands to it.
#[derive(Debug, Default)]
pub(crate) struct RecordingBridge {
    pub(crate) frames: Mutex<Vec<StompFrame>>,
    pub(crate) broker_acks: Mutex<Vec<AckCommand>>,
    pub(crate) client_acks: Mutex<Vec<(Option<String>, Vec<MessageId>)>>,
    pub(crate) conversions: Mutex<Vec<Conversion>>,
    pub(crate) subscriber_closed: AtomicBool,
}

impl RecordingBridge {
    pub(crate) fn frames(&self) -> Vec<StompFrame> {
        self.frames.lock().unwrap().clone()
    }

    pub(crate) fn broker_acks(&self) -> Vec<AckCommand> {
        self.broker_acks.lock().unwrap().clone()
    }

    pub(crate) fn client_acks(&self) -> Vec<(Option<String>, Vec<MessageId>)> {
        self.client_acks.lock().unwrap().clone()
    }

    pub(crate) fn conversions(&self) -> Vec<Conversion> {
        self.conversions.lock().unwrap().clone()
    }

    pub(crate) fn close_subscriber(&self) {
        self.subscriber_closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProtocolBridge for RecordingBridge {
    fn convert_message(
        &self,
        message: &Message,
        ignore_transformation: bool,
    ) -> Result<StompFrame, BridgeError> {
        self.conversions.lock().unwrap().push(Conversion {
            message_id: message.message_id.clone(),
            transformation: message.property(TRANSFORMATION_PROPERTY).map(str::to_string),
            ignore_transformation,
        });

        let mut frame = StompFrame::new("CONVERTED");
        frame.set_header(headers::MESSAGE_ID, message.message_id.to_string());
        frame.set_header(headers::DESTINATION, message.destination.as_str());
        frame.body = message.payload.clone();
        Ok(frame)
    }

    async fn send_to_subscriber(&self, frame: StompFrame) -> Result<(), BridgeError> {
        if self.subscriber_closed.load(Ordering::SeqCst) {
            return Err(BridgeError::SubscriberClosed);
        }
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }

    async fn send_to_broker(&self, ack: AckCommand) -> Result<(), BridgeError> {
        self.broker_acks.lock().unwrap().push(ack);
        Ok(())
    }

    async fn after_client_ack(&self, subscription_id: Option<&str>, acknowledged: &[MessageId]) {
        self.client_acks
            .lock()
            .unwrap()
            .push((subscription_id.map(str::to_string), acknowledged.to_vec()));
    }
}

pub(crate) fn consumer_info() -> ConsumerInfo {
    ConsumerInfo {
        consumer_id: ConsumerId {
            connection_id: "ID:stomp-conn-1".to_string(),
            session_id: 1,
            value: 1,
        },
        destination: BROKER_DESTINATION.to_string(),
    }
}

pub(crate) fn msg_id(seq: u64) -> MessageId {
    MessageId::new(PRODUCER_ID, seq)
}

pub(crate) fn tx(value: u64) -> TransactionId {
    TransactionId::new("ID:stomp-conn-1", value)
}

pub(crate) fn make_message(seq: u64, body_kind: BodyKind) -> Message {
    Message {
        message_id: msg_id(seq),
        destination: BROKER_DESTINATION.to_string(),
        body_kind,
        payload: format!("payload-{}", seq).into_bytes(),
        properties: HashMap::new(),
        redelivery_counter: 0,
    }
}

pub(crate) fn make_dispatch(seq: u64) -> MessageDispatch {
    MessageDispatch {
        consumer_id: consumer_info().consumer_id,
        destination: BROKER_DESTINATION.to_string(),
        message: make_message(seq, BodyKind::Text),
    }
}

pub(crate) fn new_tracker(ack_mode: AckMode) -> (Arc<RecordingBridge>, AckTracker) {
    let options = SubscriptionOptions::new("/queue/orders", ack_mode).with_subscription_id("sub-0");
    new_tracker_with(options)
}

pub(crate) fn new_tracker_with(options: SubscriptionOptions) -> (Arc<RecordingBridge>, AckTracker) {
    let bridge = Arc::new(RecordingBridge::default());
    let tracker = AckTracker::new(options, consumer_info(), bridge.clone());
    (bridge, tracker)
}

/// Dispatches the given sequences in order.
pub(crate) async fn dispatch_all(tracker: &AckTracker, sequences: &[u64]) {
    for seq in sequences {
        tracker
            .dispatch(make_dispatch(*seq), None)
            .await
            .expect("dispatch");
    }
}
