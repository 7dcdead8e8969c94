//! Subscription tracker
//!
//! Builds op 5 frames from a caller's intent and remembers the scope the
//! server was told about. The scope outlives the transport: after a
//! reconnect the channel focus is sent again together with the fresh guild
//! list.

use chat_core::Snowflake;
use parking_lot::Mutex;

use crate::connection::Transport;
use crate::protocol::{ClientFrame, SubscribePayload};

/// Channel part of a subscription update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelScope {
    /// Leave the server-side channel scope as it is
    #[default]
    Unchanged,
    /// Explicitly no channel; rejected before sending
    Null,
    /// Focus a single channel
    Only(Snowflake),
}

/// What the caller wants the server to deliver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionIntent {
    pub guilds: Option<Vec<Snowflake>>,
    pub channel: ChannelScope,
}

impl SubscriptionIntent {
    /// Subscribe to a set of guilds; duplicates are dropped, order is kept
    pub fn guilds<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = Snowflake>,
    {
        let mut guilds: Vec<Snowflake> = Vec::new();
        for id in ids {
            if !guilds.contains(&id) {
                guilds.push(id);
            }
        }
        Self {
            guilds: Some(guilds),
            channel: ChannelScope::Unchanged,
        }
    }

    /// Focus a single channel
    pub fn channel(id: Snowflake) -> Self {
        Self {
            guilds: None,
            channel: ChannelScope::Only(id),
        }
    }

    /// An update carrying an explicit null channel
    pub fn null_channel() -> Self {
        Self {
            guilds: None,
            channel: ChannelScope::Null,
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: ChannelScope) -> Self {
        self.channel = channel;
        self
    }

    /// Apply this update on top of `previous`; omitted parts keep their value
    #[must_use]
    pub fn applied_to(&self, previous: &SubscriptionIntent) -> SubscriptionIntent {
        SubscriptionIntent {
            guilds: self.guilds.clone().or_else(|| previous.guilds.clone()),
            channel: match self.channel {
                ChannelScope::Unchanged => previous.channel,
                scope => scope,
            },
        }
    }

    /// Wire payload, or `None` when the channel is explicitly null
    pub fn to_payload(&self) -> Option<SubscribePayload> {
        let channel = match self.channel {
            ChannelScope::Null => return None,
            ChannelScope::Unchanged => None,
            ChannelScope::Only(id) => Some(id),
        };
        Some(SubscribePayload {
            channel,
            guilds: self.guilds.clone(),
        })
    }
}

/// Sends subscription updates and records the accumulated scope
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    state: Mutex<TrackedScope>,
}

#[derive(Debug, Default)]
struct TrackedScope {
    intent: Option<SubscriptionIntent>,
    /// Whether `intent` has been written to the current transport
    transmitted: bool,
}

impl SubscriptionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `intent` over `transport`.
    ///
    /// Returns `false` without sending when the transport is absent or not
    /// open, when the channel is explicitly null, or when the write fails.
    pub fn send_update(
        &self,
        transport: Option<&dyn Transport>,
        intent: &SubscriptionIntent,
    ) -> bool {
        let transport = match transport {
            Some(t) if t.is_open() => t,
            _ => {
                tracing::warn!("Cannot update subscription: not connected");
                return false;
            }
        };

        let Some(payload) = intent.to_payload() else {
            tracing::error!("Refusing subscription update with a null channel");
            return false;
        };

        let frame = match ClientFrame::subscribe(payload).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode subscription update");
                return false;
            }
        };

        if let Err(e) = transport.send(frame) {
            tracing::warn!(error = %e, "Failed to send subscription update");
            return false;
        }

        tracing::debug!(
            guilds = intent.guilds.as_ref().map_or(0, Vec::len),
            channel = ?intent.channel,
            "Subscription updated"
        );
        let mut state = self.state.lock();
        let merged = match &state.intent {
            Some(previous) => intent.applied_to(previous),
            None => intent.clone(),
        };
        state.intent = Some(merged);
        state.transmitted = true;
        true
    }

    /// Intent for a fresh session: `guilds` plus any remembered channel focus
    pub fn resume_intent<I>(&self, guilds: I) -> SubscriptionIntent
    where
        I: IntoIterator<Item = Snowflake>,
    {
        let channel = self
            .state
            .lock()
            .intent
            .as_ref()
            .map_or(ChannelScope::Unchanged, |intent| intent.channel);
        SubscriptionIntent::guilds(guilds).with_channel(channel)
    }

    /// The accumulated scope last written to a transport
    pub fn last_sent(&self) -> Option<SubscriptionIntent> {
        self.state.lock().intent.clone()
    }

    /// Whether the scope has been sent over the current transport
    pub fn is_transmitted(&self) -> bool {
        self.state.lock().transmitted
    }

    /// The transport went away; keep the scope but mark it unsent
    pub fn mark_untransmitted(&self) {
        self.state.lock().transmitted = false;
    }
}
