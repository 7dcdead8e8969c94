//! Builder for [`RealtimeClient`]

use std::sync::Arc;

use chat_cache::{MessageCache, SharedMessageCache};
use chat_common::ClientConfig;
use chat_core::{ChatApi, CredentialStore};

use super::RealtimeClient;
use crate::connection::{Connector, ReconnectPolicy, WsConnector};
use crate::dispatch::{EventDispatcher, DEFAULT_NOTIFICATION_CAPACITY};
use crate::error::{RealtimeError, RealtimeResult};

/// Default base for server-relative attachment URLs
pub const DEFAULT_ATTACHMENT_BASE_URL: &str = "http://localhost";

/// Builder for creating a RealtimeClient with explicit collaborators
pub struct RealtimeClientBuilder {
    gateway_url: Option<String>,
    attachment_base_url: String,
    reconnect: ReconnectPolicy,
    connector: Option<Arc<dyn Connector>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    api: Option<Arc<dyn ChatApi>>,
    cache: Option<SharedMessageCache>,
    notification_capacity: usize,
}

impl RealtimeClientBuilder {
    pub fn new() -> Self {
        Self {
            gateway_url: None,
            attachment_base_url: DEFAULT_ATTACHMENT_BASE_URL.to_string(),
            reconnect: ReconnectPolicy::disabled(),
            connector: None,
            credentials: None,
            api: None,
            cache: None,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }

    /// Start from loaded configuration (gateway URL, attachment base, reconnect)
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new()
            .gateway_url(&config.gateway.url)
            .attachment_base_url(&config.gateway.attachment_base_url)
            .reconnect(ReconnectPolicy::from(&config.reconnect))
    }

    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = Some(url.into());
        self
    }

    pub fn attachment_base_url(mut self, url: impl Into<String>) -> Self {
        self.attachment_base_url = url.into();
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Transport factory; defaults to [`WsConnector`]
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn api(mut self, api: Arc<dyn ChatApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Share an existing cache; a fresh one is created otherwise
    pub fn cache(mut self, cache: SharedMessageCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }

    /// Build the client
    ///
    /// # Errors
    /// Returns `RealtimeError::MissingSetting` if the gateway URL, credential
    /// store, or API client was not supplied
    pub fn build(self) -> RealtimeResult<RealtimeClient> {
        let gateway_url = self
            .gateway_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(RealtimeError::MissingSetting("gateway_url"))?;
        let credentials = self
            .credentials
            .ok_or(RealtimeError::MissingSetting("credentials"))?;
        let api = self.api.ok_or(RealtimeError::MissingSetting("api"))?;
        let connector: Arc<dyn Connector> = match self.connector {
            Some(connector) => connector,
            None => Arc::new(WsConnector),
        };
        let cache = self.cache.unwrap_or_else(MessageCache::new_shared);

        let dispatcher =
            EventDispatcher::new(cache, self.attachment_base_url, self.notification_capacity);

        Ok(RealtimeClient::from_parts(
            gateway_url,
            self.reconnect,
            connector,
            credentials,
            api,
            dispatcher,
        ))
    }
}

impl Default for RealtimeClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
