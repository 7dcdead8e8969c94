//! Duplex transport abstraction
//!
//! A [`Connector`] opens a [`Transport`] and hands back the stream of
//! [`TransportEvent`]s it produces. The client never touches the socket
//! directly, so tests can drive it with an in-memory transport.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::TransportError;

/// Lifecycle and data events produced by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established and writable
    Open,
    /// A text frame arrived
    Message(String),
    /// A transport-level error; a `Closed` event may follow
    Error(String),
    /// The connection is gone; always the last event
    Closed { code: Option<u16>, reason: String },
}

/// Receiving half of a transport's event stream
pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

/// An open (or opening) duplex connection
pub trait Transport: Send + Sync {
    /// Writable right now
    fn is_open(&self) -> bool;

    /// Fully closed; a closing transport is not yet closed
    fn is_closed(&self) -> bool;

    /// Queue a text frame
    fn send(&self, text: String) -> Result<(), TransportError>;

    /// Start closing the connection
    fn close(&self);
}

/// Opens transports to a URL
pub trait Connector: Send + Sync {
    /// Construct a transport.
    ///
    /// Fails synchronously only when the transport cannot be constructed
    /// (for example an invalid URL). Connection failures are reported later
    /// as `Error`/`Closed` events.
    fn open(&self, url: &str) -> Result<(Arc<dyn Transport>, TransportEvents), TransportError>;
}
