pub(crate) struct Metric {
    pub name: &'static str,
    description: &'static str,
}

pub(crate) const COUNTERS: [Metric; 5] = [
    MESSAGES_DISPATCHED_TOTAL,
    ACKS_TOTAL,
    STALE_ACKS_TOTAL,
    TX_COMMITS_TOTAL,
    TX_ABORTS_TOTAL,
];
pub(crate) const GAUGES: [Metric; 1] = [PENDING_MESSAGES];

pub(crate) const MESSAGES_DISPATCHED_TOTAL: Metric = Metric {
    name: "stomp_subscription_messages_dispatched_total",
    description: "Total messages dispatched to STOMP subscribers (msg)",
};

pub(crate) const ACKS_TOTAL: Metric = Metric {
    name: "stomp_subscription_acks_total",
    description: "Total acknowledgment commands produced for the broker, labeled by kind",
};

pub(crate) const STALE_ACKS_TOTAL: Metric = Metric {
    name: "stomp_subscription_stale_acks_total",
    description: "Total ACK/NACK frames referencing a message that is no longer pending",
};

pub(crate) const TX_COMMITS_TOTAL: Metric = Metric {
    name: "stomp_subscription_tx_commits_total",
    description: "Total transaction commits applied to subscriptions",
};

pub(crate) const TX_ABORTS_TOTAL: Metric = Metric {
    name: "stomp_subscription_tx_aborts_total",
    description: "Total transaction aborts applied to subscriptions",
};

pub(crate) const PENDING_MESSAGES: Metric = Metric {
    name: "stomp_subscription_pending_messages",
    description: "Messages dispatched to the subscriber and awaiting acknowledgment",
};

/// Describes the subscription metrics to the installed recorder.
/// The library never installs a recorder or exporter itself.
pub fn register_metrics() {
    for metric in COUNTERS {
        metrics::describe_counter!(metric.name, metric.description);
    }

    for metric in GAUGES {
        metrics::describe_gauge!(metric.name, metric.description);
    }
}
