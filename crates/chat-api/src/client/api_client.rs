//! HTTP client for the chat REST API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_common::{ApiConfig, ClientConfig};
use chat_core::{
    ApiError, ApiResult, CachedMessage, ChatApi, CredentialStore, Guild, MessageRecord, Snowflake,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;

/// REST client authenticated with the token from a [`CredentialStore`]
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    attachment_base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("attachment_base_url", &self.attachment_base_url)
            .finish()
    }
}

impl ApiClient {
    /// Create a client for the given API settings
    pub fn new(
        config: &ApiConfig,
        attachment_base_url: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            attachment_base_url: attachment_base_url.into(),
            credentials,
        })
    }

    /// Create a client from the full client configuration
    pub fn from_config(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> ApiResult<Self> {
        Self::new(
            &config.api,
            config.gateway.attachment_base_url.clone(),
            credentials,
        )
    }

    /// Base URL requests are made against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a JSON document
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let mut request = self.http.get(self.url(path)).header(ACCEPT, "application/json");
        if let Some(token) = self.credentials.token() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(path, error = %e, "API request failed");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "API request rejected");
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        tracing::debug!(path, status = status.as_u16(), "API request succeeded");
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn current_user_guilds(&self) -> ApiResult<Vec<Guild>> {
        self.get_json("/user/me/guilds").await
    }

    async fn channel_messages(&self, channel_id: Snowflake) -> ApiResult<Vec<CachedMessage>> {
        let records: Vec<MessageRecord> = self
            .get_json(&format!("/channel/{channel_id}/messages"))
            .await?;

        Ok(records
            .into_iter()
            .map(|r| r.into_cached(&self.attachment_base_url))
            .collect())
    }
}
