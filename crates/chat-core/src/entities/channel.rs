//! Channel entity - represents a text channel, DM, or category

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Channel type as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Option<u32>", into = "u32")]
pub enum ChannelType {
    /// Guild text channel
    #[default]
    GuildText,
    /// Direct message between users
    Dm,
    /// Guild category for organizing channels
    GuildCategory,
    /// Group direct message
    GroupDm,
    /// Guild voice channel
    GuildVoice,
    /// Guild announcement channel
    GuildAnnouncement,
    /// A type code this client does not know yet
    Other(u32),
}

impl ChannelType {
    /// Get the numeric value
    #[inline]
    #[must_use]
    pub fn code(self) -> u32 {
        self.into()
    }
}

impl From<u32> for ChannelType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildCategory,
            3 => Self::GroupDm,
            4 => Self::GuildVoice,
            5 => Self::GuildAnnouncement,
            other => Self::Other(other),
        }
    }
}

/// A `null` type code reads as the default
impl From<Option<u32>> for ChannelType {
    fn from(value: Option<u32>) -> Self {
        value.map_or_else(Self::default, Self::from)
    }
}

impl From<ChannelType> for u32 {
    fn from(ct: ChannelType) -> Self {
        match ct {
            ChannelType::GuildText => 0,
            ChannelType::Dm => 1,
            ChannelType::GuildCategory => 2,
            ChannelType::GroupDm => 3,
            ChannelType::GuildVoice => 4,
            ChannelType::GuildAnnouncement => 5,
            ChannelType::Other(code) => code,
        }
    }
}

/// Channel record, as carried by REST responses and channel-create events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub channel_type: ChannelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}
