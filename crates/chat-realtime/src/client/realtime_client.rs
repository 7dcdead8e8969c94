//! Realtime client
//!
//! Owns the gateway session: opens the transport, authenticates, reacts to
//! the server hello, keeps the heartbeat running, and routes inbound events
//! into the message cache.
//!
//! Every transport gets a session id. Events from a transport that is no
//! longer the active one are ignored, so a late close from an old socket can
//! never tear down its replacement.

use std::sync::Arc;

use chat_cache::SharedMessageCache;
use chat_core::{CachedMessage, ChatApi, CredentialStore, Snowflake};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::RealtimeClientBuilder;
use crate::connection::{
    ConnectionState, Connector, ReconnectPolicy, Transport, TransportEvent, TransportEvents,
};
use crate::dispatch::{Dispatched, EventDispatcher, GatewayNotification};
use crate::error::RealtimeResult;
use crate::handlers::{HeartbeatController, SubscriptionIntent, SubscriptionTracker};
use crate::protocol::ClientFrame;

/// Handle to the realtime session; clones share the same session
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

struct Inner {
    gateway_url: String,
    reconnect: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    credentials: Arc<dyn CredentialStore>,
    api: Arc<dyn ChatApi>,
    dispatcher: EventDispatcher,
    status: watch::Sender<ConnectionState>,
    session: Mutex<Session>,
    heartbeat: HeartbeatController,
    subscriptions: SubscriptionTracker,
}

#[derive(Default)]
struct Session {
    active: Option<ActiveTransport>,
    next_id: u64,
    reconnect_attempts: u32,
    reconnect_task: Option<JoinHandle<()>>,
}

struct ActiveTransport {
    id: u64,
    transport: Arc<dyn Transport>,
}

impl RealtimeClient {
    /// Start building a client
    pub fn builder() -> RealtimeClientBuilder {
        RealtimeClientBuilder::new()
    }

    pub(super) fn from_parts(
        gateway_url: String,
        reconnect: ReconnectPolicy,
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn CredentialStore>,
        api: Arc<dyn ChatApi>,
        dispatcher: EventDispatcher,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                gateway_url,
                reconnect,
                connector,
                credentials,
                api,
                dispatcher,
                status,
                session: Mutex::new(Session::default()),
                heartbeat: HeartbeatController::new(),
                subscriptions: SubscriptionTracker::new(),
            }),
        }
    }

    /// Open a connection to the gateway.
    ///
    /// Without a token the status becomes `Disconnected` and nothing is
    /// opened. While a previous transport is still open, opening or closing,
    /// this is a no-op. Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        self.inner.connect();
    }

    /// Close the connection and cancel any pending reconnect
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Send a subscription update (op 5) over the open transport.
    ///
    /// Returns `false` if nothing was sent.
    pub fn send_subscription_update(&self, intent: &SubscriptionIntent) -> bool {
        let transport = self.inner.active_transport();
        self.inner
            .subscriptions
            .send_update(transport.as_deref(), intent)
    }

    /// The subscription scope last written to the server.
    ///
    /// Kept across disconnects and re-sent after the next hello.
    pub fn last_subscription(&self) -> Option<SubscriptionIntent> {
        self.inner.subscriptions.last_sent()
    }

    /// Whether the current scope has been sent over the open transport
    pub fn is_subscription_transmitted(&self) -> bool {
        self.inner.subscriptions.is_transmitted()
    }

    /// Fetch a channel's history over REST and replace its cached messages.
    ///
    /// Returns the number of messages now cached for the channel.
    pub async fn load_channel(&self, channel_id: Snowflake) -> RealtimeResult<usize> {
        let messages = self.inner.api.channel_messages(channel_id).await?;
        let count = self
            .inner
            .dispatcher
            .cache()
            .replace_channel(channel_id, messages);
        tracing::debug!(%channel_id, count, "Channel history loaded");
        Ok(count)
    }

    /// Current connection status
    pub fn status(&self) -> ConnectionState {
        *self.inner.status.borrow()
    }

    /// Observe status changes
    pub fn status_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.status.subscribe()
    }

    /// Shared message cache
    pub fn cache(&self) -> &SharedMessageCache {
        self.inner.dispatcher.cache()
    }

    /// Subscribe to channel create/delete notifications
    pub fn notifications(&self) -> broadcast::Receiver<GatewayNotification> {
        self.inner.dispatcher.subscribe()
    }

    /// Cached messages of one channel
    pub fn messages(&self, channel_id: Snowflake) -> Vec<CachedMessage> {
        self.cache().messages(channel_id)
    }

    /// Server heartbeat interval of the running heartbeat
    pub fn heartbeat_interval(&self) -> Option<u64> {
        self.inner.heartbeat.interval_ms()
    }

    pub fn is_heartbeat_running(&self) -> bool {
        self.inner.heartbeat.is_running()
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("gateway_url", &self.inner.gateway_url)
            .field("status", &self.status())
            .field("reconnect", &self.inner.reconnect)
            .finish()
    }
}

impl Inner {
    fn set_status(&self, state: ConnectionState) {
        let changed = self.status.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            tracing::debug!(status = %state, "Connection status changed");
        }
    }

    fn active_transport(&self) -> Option<Arc<dyn Transport>> {
        self.session
            .lock()
            .active
            .as_ref()
            .map(|active| Arc::clone(&active.transport))
    }

    /// The active transport, if it is still the one with `id`
    fn current_transport(&self, id: u64) -> Option<Arc<dyn Transport>> {
        self.session
            .lock()
            .active
            .as_ref()
            .filter(|active| active.id == id)
            .map(|active| Arc::clone(&active.transport))
    }

    fn is_current(&self, id: u64) -> bool {
        self.current_transport(id).is_some()
    }

    fn connect(self: &Arc<Self>) {
        let Some(token) = self.credentials.token().filter(|t| !t.is_empty()) else {
            tracing::warn!("Cannot connect: no auth token available");
            self.set_status(ConnectionState::Disconnected);
            return;
        };

        let mut session = self.session.lock();
        if let Some(active) = &session.active {
            if !active.transport.is_closed() {
                tracing::warn!("Already connected or connecting");
                return;
            }
        }
        if let Some(task) = session.reconnect_task.take() {
            task.abort();
        }

        self.set_status(ConnectionState::Connecting);
        match self.connector.open(&self.gateway_url) {
            Ok((transport, events)) => {
                session.next_id += 1;
                let id = session.next_id;
                session.active = Some(ActiveTransport {
                    id,
                    transport: Arc::clone(&transport),
                });
                drop(session);

                tracing::info!(url = %self.gateway_url, session = id, "Connecting to gateway");
                tokio::spawn(Arc::clone(self).run_events(id, transport, token, events));
            }
            Err(e) => {
                session.active = None;
                drop(session);
                tracing::error!(url = %self.gateway_url, error = %e, "Failed to create transport");
                self.set_status(ConnectionState::Error);
            }
        }
    }

    fn disconnect(&self) {
        let active = {
            let mut session = self.session.lock();
            if let Some(task) = session.reconnect_task.take() {
                task.abort();
            }
            session.reconnect_attempts = 0;
            session.active.take()
        };

        if let Some(active) = active {
            self.heartbeat.stop();
            self.subscriptions.mark_untransmitted();
            active.transport.close();
            self.set_status(ConnectionState::Disconnected);
            tracing::info!(session = active.id, "Disconnected from gateway");
        }
    }

    async fn run_events(
        self: Arc<Self>,
        id: u64,
        transport: Arc<dyn Transport>,
        token: String,
        mut events: TransportEvents,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Open => self.on_open(id, &transport, &token),
                TransportEvent::Message(text) => self.on_message(id, &transport, &text),
                TransportEvent::Error(error) => self.on_error(id, &error),
                TransportEvent::Closed { code, reason } => {
                    self.on_close(id, code, &reason);
                    return;
                }
            }
        }
        self.on_close(id, None, "event stream ended");
    }

    fn on_open(&self, id: u64, transport: &Arc<dyn Transport>, token: &str) {
        if !self.is_current(id) {
            return;
        }
        self.set_status(ConnectionState::Connecting);

        let sent = match ClientFrame::auth(token).to_json() {
            Ok(frame) => transport.send(frame).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match sent {
            Ok(()) => tracing::debug!(session = id, "Auth frame sent"),
            Err(error) => {
                tracing::error!(session = id, %error, "Failed to send auth frame");
                self.set_status(ConnectionState::Error);
                transport.close();
            }
        }
    }

    fn on_message(self: &Arc<Self>, id: u64, transport: &Arc<dyn Transport>, text: &str) {
        if !self.is_current(id) {
            tracing::trace!(session = id, "Ignoring frame from superseded transport");
            return;
        }

        match self.dispatcher.handle_text(text) {
            Dispatched::Hello {
                heartbeat_interval_ms,
            } => self.on_hello(id, transport, heartbeat_interval_ms),
            Dispatched::Handled | Dispatched::Dropped => {}
        }
    }

    fn on_hello(self: &Arc<Self>, id: u64, transport: &Arc<dyn Transport>, interval_ms: u64) {
        self.session.lock().reconnect_attempts = 0;
        self.set_status(ConnectionState::Connected);
        tracing::info!(session = id, heartbeat_interval_ms = interval_ms, "Gateway session ready");

        self.heartbeat.start(interval_ms, Arc::clone(transport));
        tokio::spawn(Arc::clone(self).initial_subscription(id));
    }

    /// Subscribe to every guild the user belongs to (an empty list on
    /// failure), keeping any channel focus from an earlier session
    async fn initial_subscription(self: Arc<Self>, id: u64) {
        let guilds = match self.api.current_user_guilds().await {
            Ok(guilds) => guilds,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch guilds for initial subscription");
                Vec::new()
            }
        };

        let Some(transport) = self.current_transport(id) else {
            tracing::debug!(session = id, "Connection replaced before initial subscription");
            return;
        };

        let intent = self.subscriptions.resume_intent(guilds.iter().map(|g| g.id));
        self.subscriptions.send_update(Some(&*transport), &intent);
    }

    fn on_error(&self, id: u64, error: &str) {
        if !self.is_current(id) {
            return;
        }
        tracing::error!(session = id, %error, "Transport error");
        self.set_status(ConnectionState::Error);
    }

    fn on_close(self: &Arc<Self>, id: u64, code: Option<u16>, reason: &str) {
        {
            let mut session = self.session.lock();
            match &session.active {
                Some(active) if active.id == id => session.active = None,
                _ => {
                    tracing::trace!(session = id, "Ignoring close of superseded transport");
                    return;
                }
            }
        }

        self.heartbeat.stop();
        self.subscriptions.mark_untransmitted();
        self.set_status(ConnectionState::Disconnected);
        tracing::info!(session = id, ?code, reason, "Gateway connection closed");

        self.schedule_reconnect();
    }

    fn schedule_reconnect(self: &Arc<Self>) {
        let mut session = self.session.lock();
        if !self.reconnect.should_attempt(session.reconnect_attempts) {
            if self.reconnect.enabled {
                tracing::warn!(
                    attempts = session.reconnect_attempts,
                    "Reconnect attempts exhausted"
                );
            }
            return;
        }

        let delay = self.reconnect.delay_for_attempt(session.reconnect_attempts);
        session.reconnect_attempts = session.reconnect_attempts.saturating_add(1);
        tracing::info!(
            attempt = session.reconnect_attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );

        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.session.lock().reconnect_task = None;
            inner.connect();
        });
        if let Some(previous) = session.reconnect_task.replace(task) {
            previous.abort();
        }
    }
}
