//! Frame payload definitions

use chat_core::{Channel, MessageRecord, Snowflake};
use serde::{Deserialize, Serialize};

/// Payload for client op 1 (Auth)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
}

/// Payload for client op 2 (Heartbeat)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub since: u64,
}

/// Payload for client op 5 (Subscribe)
///
/// Omitted fields leave that part of the server-side scope unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guilds: Option<Vec<Snowflake>>,
}

/// Payload for op 0 without a known sub-type
#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreatePayload {
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub message: MessageRecord,
}

/// Payload for op 0, t 106
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelCreatePayload {
    pub guild_id: Snowflake,
    pub channel: Channel,
}

/// Payload for op 0, t 109
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChannelDeletePayload {
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
}

/// Payload for op 0, t 107
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MessageDeletePayload {
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
}
