//! Local message storage

mod message_cache;

pub use message_cache::{ChannelMessages, MessageCache, SharedMessageCache};
