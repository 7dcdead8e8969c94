//! # chat-realtime
//!
//! Realtime gateway client: connection lifecycle, heartbeat, subscription
//! scope, and event dispatch into the shared message cache.
//!
//! ## Example
//!
//! ```ignore
//! use chat_realtime::{RealtimeClient, SubscriptionIntent};
//!
//! let client = RealtimeClient::builder()
//!     .gateway_url("ws://localhost:3001/ws")
//!     .credentials(credentials)
//!     .api(api)
//!     .build()?;
//!
//! client.connect();
//! client.send_subscription_update(&SubscriptionIntent::channel(channel_id));
//! ```

pub mod client;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod protocol;

#[cfg(test)]
mod test_support;

pub use client::{RealtimeClient, RealtimeClientBuilder};
pub use connection::{
    ConnectionState, Connector, ReconnectPolicy, Transport, TransportEvent, TransportEvents,
    WsConnector,
};
pub use dispatch::{Dispatched, EventDispatcher, GatewayNotification};
pub use error::{FrameError, RealtimeError, RealtimeResult, TransportError};
pub use handlers::{ChannelScope, HeartbeatController, SubscriptionIntent, SubscriptionTracker};
