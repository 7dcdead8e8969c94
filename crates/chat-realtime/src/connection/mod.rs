//! Connection management
//!
//! Transport abstraction, the WebSocket implementation, status, and
//! reconnection policy.

mod reconnect;
mod state;
mod transport;
mod ws;

pub use reconnect::ReconnectPolicy;
pub use state::ConnectionState;
pub use transport::{Connector, Transport, TransportEvent, TransportEvents};
pub use ws::{WsConnector, WsTransport};
