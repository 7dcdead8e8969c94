//! Test helpers for integration tests
//!
//! Provides a stub WebSocket gateway, client construction against it, and
//! bounded waits on client state.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chat_api::ApiClient;
use chat_common::{ApiConfig, MemoryCredentialStore};
use chat_realtime::{ConnectionState, RealtimeClient, ReconnectPolicy};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::fixtures::{ATTACHMENT_BASE, TEST_TOKEN};

/// Upper bound for any single wait in a test
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Run `fut` with [`WAIT_TIMEOUT`]
pub async fn within<F, T>(what: &str, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(WAIT_TIMEOUT, fut)
        .await
        .map_err(|_| anyhow!("timed out waiting for {what}"))
}

/// A WebSocket server that accepts client connections and lets the test
/// play the gateway's side of the protocol
pub struct StubGateway {
    pub addr: SocketAddr,
    peers: mpsc::UnboundedReceiver<GatewayPeer>,
    accept_loop: JoinHandle<()>,
}

impl StubGateway {
    /// Bind to an ephemeral port and start accepting
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (peer_tx, peers) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let peer_tx = peer_tx.clone();
                tokio::spawn(async move {
                    if let Some(peer) = serve_peer(stream).await {
                        let _ = peer_tx.send(peer);
                    }
                });
            }
        });

        Ok(Self {
            addr,
            peers,
            accept_loop: handle,
        })
    }

    /// Gateway URL for clients
    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Wait for the next client connection
    pub async fn accept(&mut self) -> Result<GatewayPeer> {
        within("a client connection", self.peers.recv())
            .await?
            .context("gateway stopped accepting")
    }
}

impl Drop for StubGateway {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

/// The server side of one client connection
pub struct GatewayPeer {
    outgoing: mpsc::UnboundedSender<Message>,
    incoming: mpsc::UnboundedReceiver<String>,
}

impl GatewayPeer {
    /// Push a frame to the client
    pub fn send_json(&self, frame: &Value) {
        let _ = self.outgoing.send(Message::Text(frame.to_string()));
    }

    /// Close the connection from the server side
    pub fn close(&self) {
        let _ = self.outgoing.send(Message::Close(None));
    }

    /// Next raw text frame from the client
    pub async fn recv_text(&mut self) -> Result<String> {
        within("a client frame", self.incoming.recv())
            .await?
            .context("client connection closed")
    }

    /// Next frame from the client, parsed
    pub async fn recv_json(&mut self) -> Result<Value> {
        let text = self.recv_text().await?;
        serde_json::from_str(&text).with_context(|| format!("client sent invalid JSON: {text}"))
    }

    /// Skip frames until one with `op` arrives
    pub async fn recv_op(&mut self, op: u64) -> Result<Value> {
        loop {
            let frame = self.recv_json().await?;
            if frame["op"].as_u64() == Some(op) {
                return Ok(frame);
            }
        }
    }

    /// Drain frames until the client closes the connection
    pub async fn wait_closed(&mut self) -> Result<()> {
        within("the client to close", async {
            while self.incoming.recv().await.is_some() {}
        })
        .await
    }
}

async fn serve_peer(stream: TcpStream) -> Option<GatewayPeer> {
    let ws = tokio_tungstenite::accept_async(stream).await.ok()?;
    let (mut sink, mut source) = ws.split();
    let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
    let (incoming_tx, incoming) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                out = outgoing_rx.recv() => {
                    let Some(message) = out else { break };
                    let closing = matches!(message, Message::Close(_));
                    if sink.send(message).await.is_err() || closing {
                        break;
                    }
                }
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let _ = incoming_tx.send(text);
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
        let _ = sink.close().await;
    });

    Some(GatewayPeer { outgoing, incoming })
}

/// Build a client wired to `gateway` and the REST stub at `api_uri`
pub fn client_for(
    gateway: &StubGateway,
    api_uri: &str,
    reconnect: ReconnectPolicy,
) -> Result<RealtimeClient> {
    let credentials = Arc::new(MemoryCredentialStore::with_token(TEST_TOKEN));
    let api = ApiClient::new(
        &ApiConfig {
            base_url: api_uri.to_string(),
            timeout_secs: 5,
        },
        ATTACHMENT_BASE,
        credentials.clone(),
    )?;

    Ok(RealtimeClient::builder()
        .gateway_url(gateway.url())
        .attachment_base_url(ATTACHMENT_BASE)
        .reconnect(reconnect)
        .credentials(credentials)
        .api(Arc::new(api))
        .build()?)
}

/// Wait until the client reports `state`
pub async fn wait_for_status(client: &RealtimeClient, state: ConnectionState) -> Result<()> {
    let mut status = client.status_receiver();
    let what = format!("status {state}");
    let reached = within(&what, status.wait_for(|s| *s == state)).await?;
    reached.map(|_| ()).map_err(|_| anyhow!("client dropped"))
}

/// Wait until `check` holds for the client's message cache
pub async fn wait_for_cache<F>(client: &RealtimeClient, what: &str, check: F) -> Result<()>
where
    F: Fn(&RealtimeClient) -> bool,
{
    let mut updates = client.cache().subscribe();
    let outcome = within(what, async {
        loop {
            if check(client) {
                return Ok(());
            }
            if updates.changed().await.is_err() {
                return Err(anyhow!("cache dropped"));
            }
        }
    })
    .await?;
    outcome
}
