//! Gateway operation codes
//!
//! Op codes are scoped by direction: the same number means different things
//! depending on who sends it.

use serde::{Serialize, Serializer};

/// Op codes sent by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientOp {
    /// Authenticate the connection
    Auth = 1,
    /// Liveness ping
    Heartbeat = 2,
    /// Replace the subscription scope
    Subscribe = 5,
}

impl ClientOp {
    /// Get the raw integer value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get the name of this op code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auth => "Auth",
            Self::Heartbeat => "Heartbeat",
            Self::Subscribe => "Subscribe",
        }
    }
}

impl Serialize for ClientOp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl std::fmt::Display for ClientOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}

/// Op codes sent by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerOp {
    /// An event, discriminated further by the `t` field
    Event = 0,
    /// Sent after authentication; carries the heartbeat interval
    Hello = 1,
}

impl ServerOp {
    /// Create a `ServerOp` from a raw integer value
    #[must_use]
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Event),
            1 => Some(Self::Hello),
            _ => None,
        }
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Event sub-types carried in `t` for op 0
///
/// A missing or unknown `t` means a newly created chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EventType {
    ChannelCreate = 106,
    MessageDelete = 107,
    ChannelDelete = 109,
}

impl EventType {
    /// Create an `EventType` from a raw integer value
    #[must_use]
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            106 => Some(Self::ChannelCreate),
            107 => Some(Self::MessageDelete),
            109 => Some(Self::ChannelDelete),
            _ => None,
        }
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the name of this event type
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ChannelCreate => "CHANNEL_CREATE",
            Self::MessageDelete => "MESSAGE_DELETE",
            Self::ChannelDelete => "CHANNEL_DELETE",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u16())
    }
}
