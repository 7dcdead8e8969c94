//! Inbound event routing
//!
//! Routes decoded server frames to the message cache and to channel-list
//! subscribers.

mod dispatcher;
mod notifications;

pub use dispatcher::{Dispatched, EventDispatcher, DEFAULT_NOTIFICATION_CAPACITY};
pub use notifications::GatewayNotification;
