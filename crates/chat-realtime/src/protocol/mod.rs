//! Gateway protocol definitions
//!
//! Defines op codes, payloads, and the frame codec.

mod frames;
mod opcodes;
mod payloads;

pub use frames::{ClientFrame, ServerFrame};
pub use opcodes::{ClientOp, EventType, ServerOp};
pub use payloads::{
    AuthPayload, ChannelCreatePayload, ChannelDeletePayload, HeartbeatPayload,
    MessageCreatePayload, MessageDeletePayload, SubscribePayload,
};
