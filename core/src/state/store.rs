use std::collections::HashMap;

use scotty_protocol::models::Message;
use scotty_protocol::models::Sender;

/// Where a locally held message stands relative to the server's copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Shown optimistically; the request that stores it has not finished.
    Pending,
    /// Part of the server's message sequence.
    Delivered,
    /// The request that should have stored it failed. Kept on screen.
    Failed,
    /// Client-only notice that the server never sees.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub message: Message,
    pub delivery: Delivery,
}

/// Client-side cache of the loaded conversation's messages, in display
/// order.
///
/// `Delivered` entries mirror a prefix of the server's sequence; their count
/// is what polling compares the server's length against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationStore {
    entries: Vec<StoredMessage>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[StoredMessage] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|entry| &entry.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn delivered_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.delivery == Delivery::Delivered)
            .count()
    }

    /// Append an optimistic message and return its index for [`Self::mark`].
    pub fn push_pending(&mut self, message: Message) -> usize {
        self.push(message, Delivery::Pending)
    }

    pub fn push_delivered(&mut self, message: Message) -> usize {
        self.push(message, Delivery::Delivered)
    }

    pub fn push_local(&mut self, message: Message) -> usize {
        self.push(message, Delivery::Local)
    }

    fn push(&mut self, message: Message, delivery: Delivery) -> usize {
        self.entries.push(StoredMessage { message, delivery });
        self.entries.len() - 1
    }

    /// Update the delivery state of the entry at `index`. Out-of-range
    /// indexes are ignored.
    pub fn mark(&mut self, index: usize, delivery: Delivery) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.delivery = delivery;
        }
    }

    /// Replace local state with the server's authoritative sequence.
    ///
    /// Server messages become the delivered prefix. Pending and failed
    /// messages survive unless the server now holds a message from the same
    /// sender with the same body beyond what was previously delivered. Local
    /// notices are dropped.
    pub fn hydrate(&mut self, server: Vec<Message>) {
        let previously_delivered = self.delivered_count();
        let mut unmatched: HashMap<(Sender, &str), usize> = HashMap::new();
        for message in server.iter().skip(previously_delivered) {
            if message.sender != Sender::System {
                *unmatched
                    .entry((message.sender, message.body.as_str()))
                    .or_default() += 1;
            }
        }

        let mut kept = Vec::new();
        for entry in &self.entries {
            if !entry.is_unacknowledged() {
                continue;
            }
            match unmatched.get_mut(&(entry.message.sender, entry.message.body.as_str())) {
                Some(count) if *count > 0 => *count -= 1,
                _ => kept.push(entry.clone()),
            }
        }

        let mut entries: Vec<StoredMessage> = server
            .into_iter()
            .map(|message| StoredMessage {
                message,
                delivery: Delivery::Delivered,
            })
            .collect();
        entries.extend(kept);
        self.entries = entries;
    }

    /// Append every server message past the delivered count and return the
    /// ones not already on screen.
    ///
    /// A send can fail on the client after the server stored the message. When
    /// the new tail holds such a message, the failed entry is marked
    /// delivered in place instead of being shown a second time. A server
    /// sequence that is not longer than what is delivered yields nothing.
    pub fn apply_poll(&mut self, server: Vec<Message>) -> Vec<Message> {
        let delivered = self.delivered_count();
        if server.len() <= delivered {
            return Vec::new();
        }
        let mut fresh = Vec::new();
        for message in server.into_iter().skip(delivered) {
            if let Some(entry) = self
                .entries
                .iter_mut()
                .find(|entry| entry.is_unacknowledged() && entry.message == message)
            {
                entry.delivery = Delivery::Delivered;
                continue;
            }
            self.push_delivered(message.clone());
            fresh.push(message);
        }
        fresh
    }
}

impl StoredMessage {
    fn is_unacknowledged(&self) -> bool {
        matches!(self.delivery, Delivery::Pending | Delivery::Failed)
    }
}
