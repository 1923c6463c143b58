use std::collections::{BTreeMap, HashMap};

use stomp_core::message::{MessageDispatch, MessageId};

/// Messages handed to the subscriber and not yet finally acknowledged,
/// kept in dispatch order.
///
/// Entries are keyed by a monotonically increasing dispatch sequence, so walking
/// `entries` always visits the oldest dispatch first. `index` maps a message id
/// back to its sequence for O(log n) lookups and removals.
#[derive(Debug, Default)]
pub(crate) struct DispatchedLedger {
    next_sequence: u64,
    entries: BTreeMap<u64, MessageDispatch>,
    index: HashMap<MessageId, u64>,
}

impl DispatchedLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a dispatch. A message id already present keeps its original
    /// position and has its record replaced; returns false in that case.
    pub(crate) fn insert(&mut self, md: MessageDispatch) -> bool {
        if let Some(sequence) = self.index.get(md.message_id()) {
            self.entries.insert(*sequence, md);
            return false;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.index.insert(md.message_id().clone(), sequence);
        self.entries.insert(sequence, md);
        true
    }

    pub(crate) fn contains(&self, message_id: &MessageId) -> bool {
        self.index.contains_key(message_id)
    }

    pub(crate) fn get(&self, message_id: &MessageId) -> Option<&MessageDispatch> {
        self.index
            .get(message_id)
            .and_then(|sequence| self.entries.get(sequence))
    }

    pub(crate) fn remove(&mut self, message_id: &MessageId) -> Option<MessageDispatch> {
        let sequence = self.index.remove(message_id)?;
        self.entries.remove(&sequence)
    }

    /// Removes every entry dispatched at or before `message_id`, oldest first.
    /// Nothing is removed when the id is unknown.
    pub(crate) fn remove_through(&mut self, message_id: &MessageId) -> Vec<MessageDispatch> {
        let mut removed = Vec::new();
        if !self.contains(message_id) {
            return removed;
        }

        while let Some((_, md)) = self.entries.pop_first() {
            self.index.remove(md.message_id());
            let reached = md.message_id() == message_id;
            removed.push(md);
            if reached {
                break;
            }
        }
        removed
    }

    /// Entries dispatched at or before `message_id`, oldest first.
    pub(crate) fn iter_through<'a>(
        &'a self,
        message_id: &'a MessageId,
    ) -> impl Iterator<Item = &'a MessageDispatch> + 'a {
        let mut reached = !self.contains(message_id);
        self.entries.values().take_while(move |md| {
            if reached {
                return false;
            }
            reached = md.message_id() == message_id;
            true
        })
    }

    /// Keeps only the entries for which `keep` returns true, returns how many were dropped.
    pub(crate) fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&MessageDispatch) -> bool,
    {
        let before = self.entries.len();
        let index = &mut self.index;
        self.entries.retain(|_, md| {
            let kept = keep(md);
            if !kept {
                index.remove(md.message_id());
            }
            kept
        });
        before - self.entries.len()
    }

    pub(crate) fn ids(&self) -> Vec<MessageId> {
        self.entries
            .values()
            .map(|md| md.message_id().clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Dispatches acknowledged inside a still open transaction, in the order they were acked.
#[derive(Debug, Default)]
pub(crate) struct PendingTxBuffer {
    messages: Vec<MessageDispatch>,
}

impl PendingTxBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends the dispatch unless its message is already buffered.
    pub(crate) fn push(&mut self, md: MessageDispatch) -> bool {
        if self.contains(md.message_id()) {
            return false;
        }
        self.messages.push(md);
        true
    }

    pub(crate) fn contains(&self, message_id: &MessageId) -> bool {
        self.messages.iter().any(|md| md.message_id() == message_id)
    }

    pub(crate) fn last(&self) -> Option<&MessageDispatch> {
        self.messages.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}
