//! Message records and the in-memory message store.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// Timestamp layout used for every message: `DD/MM/YYYY HH:MM`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Current local time formatted for a message.
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A delivered chat message.
///
/// Ids are minted independently by each client, so a message is identified by
/// the `(id, sender_id)` pair rather than by `id` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    #[serde(default)]
    pub timestamp: String,
    /// Absent for relay-originated messages. Some peers store it as `userId`.
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// The deduplication key.
    pub fn key(&self) -> (u64, Option<UserId>) {
        (self.id, self.sender_id)
    }
}

/// Ordered, append-only message history.
///
/// Insertion order is arrival order. No two stored messages share a key.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    last_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` unless its key is already stored.
    ///
    /// Returns whether the message was inserted. This is a linear scan; session
    /// histories are small.
    pub fn record(&mut self, message: Message) -> bool {
        if self.contains(message.id, message.sender_id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn contains(&self, id: u64, sender_id: Option<UserId>) -> bool {
        self.messages.iter().any(|m| m.key() == (id, sender_id))
    }

    /// Mint the next local message id.
    pub fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    /// Mint an id whose key with `sender_id` is not stored yet.
    pub fn next_free_id(&mut self, sender_id: Option<UserId>) -> u64 {
        loop {
            let id = self.next_id();
            if !self.contains(id, sender_id) {
                return id;
            }
        }
    }

    /// Advance the id counter past `id` if it is larger.
    pub fn observe_id(&mut self, id: u64) {
        if id > self.last_id {
            self.last_id = id;
        }
    }

    /// Highest id minted or observed so far.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Owned copy of the full history, as sent in a sync response.
    pub fn history(&self) -> Vec<Message> {
        self.messages.clone()
    }
}
