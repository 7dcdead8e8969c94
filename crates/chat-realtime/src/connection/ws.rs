//! WebSocket transport on top of `tokio-tungstenite`

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;

use super::{Connector, Transport, TransportEvent, TransportEvents};
use crate::error::TransportError;

const CONNECTING: u8 = 0;
const OPEN: u8 = 1;
const CLOSING: u8 = 2;
const CLOSED: u8 = 3;

/// Commands from the transport handle to its socket task
#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close,
}

/// Opens [`WsTransport`]s
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: &str) -> Result<(Arc<dyn Transport>, TransportEvents), TransportError> {
        let request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;

        match request.uri().scheme_str() {
            Some("ws" | "wss") => {}
            _ => return Err(TransportError::InvalidUrl(format!("{url}: not a ws:// URL"))),
        }

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicU8::new(CONNECTING));

        tokio::spawn(run_socket(
            request,
            Arc::clone(&state),
            outgoing_rx,
            event_tx,
        ));

        let transport: Arc<dyn Transport> = Arc::new(WsTransport {
            state,
            outgoing: outgoing_tx,
        });
        Ok((transport, event_rx))
    }
}

/// Handle to a WebSocket connection driven by a background task
#[derive(Debug)]
pub struct WsTransport {
    state: Arc<AtomicU8>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl Transport for WsTransport {
    fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == OPEN
    }

    fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }

    fn send(&self, text: String) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| TransportError::ChannelClosed)
    }

    fn close(&self) {
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (s == CONNECTING || s == OPEN).then_some(CLOSING)
            });
        if previous.is_ok() {
            let _ = self.outgoing.send(Outgoing::Close);
        }
    }
}

/// Drain commands until a close is requested or the handle is dropped
async fn close_requested(outgoing: &mut mpsc::UnboundedReceiver<Outgoing>) {
    while let Some(command) = outgoing.recv().await {
        if matches!(command, Outgoing::Close) {
            return;
        }
    }
}

async fn run_socket(
    request: Request,
    state: Arc<AtomicU8>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let url = request.uri().to_string();

    let stream = tokio::select! {
        result = tokio_tungstenite::connect_async(request) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "WebSocket connection failed");
                state.store(CLOSED, Ordering::Release);
                let _ = events.send(TransportEvent::Error(e.to_string()));
                let _ = events.send(TransportEvent::Closed {
                    code: None,
                    reason: e.to_string(),
                });
                return;
            }
        },
        () = close_requested(&mut outgoing) => {
            state.store(CLOSED, Ordering::Release);
            let _ = events.send(TransportEvent::Closed {
                code: None,
                reason: "closed before open".to_string(),
            });
            return;
        }
    };

    // A close requested mid-handshake wins over the late open
    if state
        .compare_exchange(CONNECTING, OPEN, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        let (mut sink, _) = stream.split();
        let _ = sink.send(Message::Close(None)).await;
        state.store(CLOSED, Ordering::Release);
        let _ = events.send(TransportEvent::Closed {
            code: None,
            reason: "closed before open".to_string(),
        });
        return;
    }

    tracing::debug!(url = %url, "WebSocket connection established");
    let _ = events.send(TransportEvent::Open);

    let (mut sink, mut stream) = stream.split();
    let mut close_frame: Option<(u16, String)> = None;

    loop {
        tokio::select! {
            command = outgoing.recv() => match command {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::warn!(error = %e, "Failed to write to WebSocket");
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    state.store(CLOSING, Ordering::Release);
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::Message(text));
                }
                Some(Ok(Message::Close(frame))) => {
                    close_frame = frame.map(|f| (u16::from(f.code), f.reason.into_owned()));
                    break;
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!("Ignoring binary frame");
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "WebSocket read error");
                    let _ = events.send(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            }
        }
    }

    state.store(CLOSED, Ordering::Release);
    let (code, reason) = close_frame.map_or((None, String::new()), |(code, reason)| {
        (Some(code), reason)
    });
    tracing::debug!(url = %url, code = ?code, "WebSocket connection closed");
    let _ = events.send(TransportEvent::Closed { code, reason });
}
