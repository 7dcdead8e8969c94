//! Channel-list notifications
//!
//! The client does not own a channel list; these are published for whoever
//! does.

use chat_core::{Channel, Snowflake};

/// Notification published when the server reports a channel change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayNotification {
    ChannelCreated { guild_id: Snowflake, channel: Channel },
    ChannelDeleted { guild_id: Snowflake, channel_id: Snowflake },
}

impl GatewayNotification {
    /// Guild the notification concerns
    pub fn guild_id(&self) -> Snowflake {
        match self {
            Self::ChannelCreated { guild_id, .. } | Self::ChannelDeleted { guild_id, .. } => {
                *guild_id
            }
        }
    }
}
