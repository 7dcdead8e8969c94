//! Channel-keyed message cache.
//!
//! Holds the messages of every channel the client has seen, in arrival
//! order, and publishes a new snapshot through a `watch` channel on each
//! real mutation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chat_core::{CachedMessage, Snowflake};
use tokio::sync::watch;

/// Snapshot type published to observers
pub type ChannelMessages = HashMap<Snowflake, Vec<CachedMessage>>;

/// Shared message cache handle
pub type SharedMessageCache = Arc<MessageCache>;

/// Message cache keyed by channel id
///
/// Invariant: ids are unique within a channel's list.
#[derive(Debug)]
pub struct MessageCache {
    tx: watch::Sender<ChannelMessages>,
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ChannelMessages::new());
        Self { tx }
    }

    /// Create an empty cache behind an `Arc`
    #[must_use]
    pub fn new_shared() -> SharedMessageCache {
        Arc::new(Self::new())
    }

    /// Observe cache snapshots
    pub fn subscribe(&self) -> watch::Receiver<ChannelMessages> {
        self.tx.subscribe()
    }

    /// Overwrite a channel's messages.
    ///
    /// Duplicate ids collapse to their first occurrence. Returns the number
    /// of messages stored; a zero channel id stores nothing.
    pub fn replace_channel(&self, channel_id: Snowflake, messages: Vec<CachedMessage>) -> usize {
        if channel_id.is_zero() {
            tracing::warn!("Ignoring message load for a zero channel id");
            return 0;
        }

        let mut seen = HashSet::with_capacity(messages.len());
        let deduped: Vec<CachedMessage> = messages
            .into_iter()
            .filter(|m| seen.insert(m.id))
            .collect();
        let count = deduped.len();

        self.tx.send_modify(|channels| {
            channels.insert(channel_id, deduped);
        });

        tracing::debug!(channel_id = %channel_id, count, "Channel messages replaced");
        count
    }

    /// Append a message to its channel unless one with the same id exists.
    ///
    /// Returns `true` when the cache changed.
    pub fn append(&self, message: CachedMessage) -> bool {
        let channel_id = message.channel_id;
        if channel_id.is_zero() {
            tracing::warn!(message_id = %message.id, "Ignoring message without a channel id");
            return false;
        }

        let message_id = message.id;
        let appended = self.tx.send_if_modified(|channels| {
            let list = channels.entry(channel_id).or_default();
            if list.iter().any(|m| m.id == message_id) {
                return false;
            }
            list.push(message);
            true
        });

        if appended {
            tracing::debug!(channel_id = %channel_id, message_id = %message_id, "Message cached");
        } else {
            tracing::trace!(channel_id = %channel_id, message_id = %message_id, "Duplicate message ignored");
        }
        appended
    }

    /// Remove a message from a channel.
    ///
    /// Returns `true` when the cache changed; nothing is published otherwise.
    pub fn remove(&self, channel_id: Snowflake, message_id: Snowflake) -> bool {
        let removed = self.tx.send_if_modified(|channels| {
            let Some(list) = channels.get_mut(&channel_id) else {
                return false;
            };
            let before = list.len();
            list.retain(|m| m.id != message_id);
            list.len() != before
        });

        if removed {
            tracing::debug!(channel_id = %channel_id, message_id = %message_id, "Message removed");
        }
        removed
    }

    /// Messages of a channel in arrival order
    pub fn messages(&self, channel_id: Snowflake) -> Vec<CachedMessage> {
        self.tx
            .borrow()
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Check if a message is cached
    pub fn contains(&self, channel_id: Snowflake, message_id: Snowflake) -> bool {
        self.tx
            .borrow()
            .get(&channel_id)
            .is_some_and(|list| list.iter().any(|m| m.id == message_id))
    }

    /// Number of channels with an entry
    pub fn channel_count(&self) -> usize {
        self.tx.borrow().len()
    }
}
