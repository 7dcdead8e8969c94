//! Session handlers
//!
//! Heartbeat keep-alive and subscription scope management.

mod heartbeat;
mod subscription;

pub use heartbeat::{tick_period, HeartbeatController, HEARTBEAT_MARGIN_MS, MIN_HEARTBEAT_PERIOD_MS};
pub use subscription::{ChannelScope, SubscriptionIntent, SubscriptionTracker};
