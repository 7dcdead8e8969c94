//! Realtime client facade
//!
//! [`RealtimeClient`] ties the connection, heartbeat, subscription, and
//! dispatch layers together behind one handle.

mod builder;
mod realtime_client;

pub use builder::{RealtimeClientBuilder, DEFAULT_ATTACHMENT_BASE_URL};
pub use realtime_client::RealtimeClient;
