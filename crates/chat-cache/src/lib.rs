//! # chat-cache
//!
//! In-process message cache for the realtime client.
//!
//! ## Features
//!
//! - **Channel-keyed store**: messages per channel in arrival order, unique by id
//! - **Change notification**: observers subscribe to a `watch` channel that
//!   only ticks on real mutations
//!
//! ## Example
//!
//! ```ignore
//! use chat_cache::MessageCache;
//!
//! let cache = MessageCache::new_shared();
//! let mut updates = cache.subscribe();
//!
//! cache.append(message);
//! updates.changed().await?;
//! ```

pub mod messages;

pub use messages::{ChannelMessages, MessageCache, SharedMessageCache};
