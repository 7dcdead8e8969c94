//! In-memory collaborators for unit tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chat_core::{ApiError, ApiResult, CachedMessage, ChatApi, Guild, Snowflake};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::connection::{Connector, Transport, TransportEvent, TransportEvents};
use crate::error::TransportError;

/// Transport that records sent frames
#[derive(Debug)]
pub struct MockTransport {
    open: AtomicBool,
    closed: AtomicBool,
    fail_sends: AtomicBool,
    sent: Mutex<Vec<String>>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl MockTransport {
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            open: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Transport with no event listener, already open
    pub fn open_detached() -> Arc<Self> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self::new(tx));
        transport.open.store(true, Ordering::SeqCst);
        transport
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    /// Closed underneath the client, with the close event still pending
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }

    /// Sent frames with the given op code
    pub fn sent_with_op(&self, op: u64) -> Vec<Value> {
        self.sent_json()
            .into_iter()
            .filter(|f| f["op"].as_u64() == Some(op))
            .collect()
    }
}

impl Transport for MockTransport {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn send(&self, text: String) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed);
        }
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        self.sent.lock().push(text);
        Ok(())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.events.send(TransportEvent::Closed {
                code: Some(1000),
                reason: "closed locally".to_string(),
            });
        }
    }
}

/// Connector handing out [`MockTransport`]s
#[derive(Debug, Default)]
pub struct MockConnector {
    opened: Mutex<Vec<(Arc<MockTransport>, mpsc::UnboundedSender<TransportEvent>)>>,
    urls: Mutex<Vec<String>>,
    reject: AtomicBool,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail construction as if the URL were invalid
    pub fn reject_urls(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }

    pub fn transport(&self, index: usize) -> Arc<MockTransport> {
        Arc::clone(&self.opened.lock()[index].0)
    }

    pub fn emit(&self, index: usize, event: TransportEvent) {
        let tx = self.opened.lock()[index].1.clone();
        let _ = tx.send(event);
    }

    /// Mark the transport open and deliver the open event
    pub fn accept(&self, index: usize) {
        self.transport(index).set_open(true);
        self.emit(index, TransportEvent::Open);
    }

    pub fn deliver(&self, index: usize, frame: &Value) {
        self.emit(index, TransportEvent::Message(frame.to_string()));
    }

    /// Peer-initiated close
    pub fn drop_connection(&self, index: usize) {
        self.transport(index).mark_closed();
        self.emit(
            index,
            TransportEvent::Closed {
                code: Some(1001),
                reason: "going away".to_string(),
            },
        );
    }
}

impl Connector for MockConnector {
    fn open(&self, url: &str) -> Result<(Arc<dyn Transport>, TransportEvents), TransportError> {
        self.urls.lock().push(url.to_string());
        if self.reject.load(Ordering::SeqCst) {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(MockTransport::new(tx.clone()));
        self.opened.lock().push((Arc::clone(&transport), tx));
        Ok((transport, rx))
    }
}

/// REST collaborator with canned responses
#[derive(Debug, Default)]
pub struct MockApi {
    guilds: Mutex<Option<Vec<Guild>>>,
    messages: Mutex<Vec<CachedMessage>>,
}

impl MockApi {
    pub fn with_guilds(ids: &[u64]) -> Arc<Self> {
        let guilds = ids
            .iter()
            .map(|id| Guild::new(Snowflake::new(*id), format!("guild {id}")))
            .collect();
        Arc::new(Self {
            guilds: Mutex::new(Some(guilds)),
            messages: Mutex::new(Vec::new()),
        })
    }

    /// Guild listing fails with a 500
    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_messages(&self, messages: Vec<CachedMessage>) {
        *self.messages.lock() = messages;
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn current_user_guilds(&self) -> ApiResult<Vec<Guild>> {
        self.guilds
            .lock()
            .clone()
            .ok_or_else(|| ApiError::from_status(500, "boom"))
    }

    async fn channel_messages(&self, channel_id: Snowflake) -> ApiResult<Vec<CachedMessage>> {
        Ok(self
            .messages
            .lock()
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect())
    }
}

/// A cached message for assertions
pub fn message(id: u64, channel_id: u64) -> CachedMessage {
    CachedMessage {
        id: Snowflake::new(id),
        channel_id: Snowflake::new(channel_id),
        author_id: Snowflake::new(1),
        author_name: "alice".to_string(),
        author_avatar_url: None,
        content: format!("message {id}"),
        timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        attachments: vec![],
    }
}

/// Let spawned tasks run to quiescence
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
