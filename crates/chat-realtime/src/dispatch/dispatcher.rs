//! Event dispatcher
//!
//! Decodes inbound text frames and applies them: messages go to the shared
//! cache, channel changes are broadcast as [`GatewayNotification`]s.

use chat_cache::SharedMessageCache;
use tokio::sync::broadcast;

use super::GatewayNotification;
use crate::protocol::ServerFrame;

/// Default buffer of the notification broadcast channel
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

/// Outcome of dispatching one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Server hello; the session layer owns the response
    Hello { heartbeat_interval_ms: u64 },
    /// Applied to the cache or published
    Handled,
    /// Malformed or unhandled; nothing changed
    Dropped,
}

/// Routes server frames to their consumers
#[derive(Debug)]
pub struct EventDispatcher {
    cache: SharedMessageCache,
    notifications: broadcast::Sender<GatewayNotification>,
    attachment_base_url: String,
}

impl EventDispatcher {
    /// Create a dispatcher writing into `cache`
    pub fn new(
        cache: SharedMessageCache,
        attachment_base_url: impl Into<String>,
        notification_capacity: usize,
    ) -> Self {
        let (notifications, _) = broadcast::channel(notification_capacity.max(1));
        Self {
            cache,
            notifications,
            attachment_base_url: attachment_base_url.into(),
        }
    }

    /// Subscribe to channel-list notifications
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayNotification> {
        self.notifications.subscribe()
    }

    pub fn cache(&self) -> &SharedMessageCache {
        &self.cache
    }

    /// Decode and apply a raw text frame
    pub fn handle_text(&self, text: &str) -> Dispatched {
        match ServerFrame::decode(text) {
            Ok(frame) => self.handle_frame(frame),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed frame");
                Dispatched::Dropped
            }
        }
    }

    /// Apply an already decoded frame
    pub fn handle_frame(&self, frame: ServerFrame) -> Dispatched {
        tracing::trace!(kind = frame.kind(), "Dispatching frame");

        match frame {
            ServerFrame::Hello {
                heartbeat_interval_ms,
            } => Dispatched::Hello {
                heartbeat_interval_ms,
            },
            ServerFrame::MessageCreate(payload) => {
                self.cache
                    .append(payload.message.into_cached(&self.attachment_base_url));
                Dispatched::Handled
            }
            ServerFrame::ChannelCreate(payload) => {
                let payload = *payload;
                self.notify(GatewayNotification::ChannelCreated {
                    guild_id: payload.guild_id,
                    channel: payload.channel,
                });
                Dispatched::Handled
            }
            ServerFrame::ChannelDelete(payload) => {
                self.notify(GatewayNotification::ChannelDeleted {
                    guild_id: payload.guild_id,
                    channel_id: payload.channel_id,
                });
                Dispatched::Handled
            }
            ServerFrame::MessageDelete(payload) => {
                if !self.cache.remove(payload.channel_id, payload.message_id) {
                    tracing::trace!(
                        channel_id = %payload.channel_id,
                        message_id = %payload.message_id,
                        "Delete for a message not in the cache"
                    );
                }
                Dispatched::Handled
            }
            ServerFrame::Unhandled { op } => {
                tracing::warn!(op, "Unhandled op code");
                Dispatched::Dropped
            }
        }
    }

    fn notify(&self, notification: GatewayNotification) {
        let guild_id = notification.guild_id();
        match self.notifications.send(notification) {
            Ok(receivers) => tracing::debug!(%guild_id, receivers, "Channel notification published"),
            Err(_) => tracing::trace!(%guild_id, "No channel notification subscribers"),
        }
    }
}
