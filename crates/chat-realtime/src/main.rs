//! Realtime chat client entry point
//!
//! Run with:
//! ```bash
//! cargo run -p chat-realtime
//! ```
//!
//! Configuration is loaded from environment variables. Set
//! `SUBSCRIBE_CHANNEL_ID` to load and follow one channel.

use std::sync::Arc;

use anyhow::Context;
use chat_api::ApiClient;
use chat_common::{
    try_init_tracing_with_config, ClientConfig, MemoryCredentialStore, TracingConfig,
};
use chat_core::Snowflake;
use chat_realtime::{ConnectionState, RealtimeClientBuilder, SubscriptionIntent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Realtime client failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("failed to load configuration")?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        gateway = %config.gateway.url,
        api = %config.api.base_url,
        "Configuration loaded"
    );

    let credentials = Arc::new(match &config.auth_token {
        Some(token) => MemoryCredentialStore::with_token(token.clone()),
        None => MemoryCredentialStore::new(),
    });
    let api = Arc::new(
        ApiClient::from_config(&config, credentials.clone())
            .context("failed to build API client")?,
    );

    let client = RealtimeClientBuilder::from_config(&config)
        .credentials(credentials)
        .api(api)
        .build()?;

    let focus_channel = std::env::var("SUBSCRIBE_CHANNEL_ID")
        .ok()
        .map(|raw| Snowflake::parse(&raw).context("SUBSCRIBE_CHANNEL_ID is not a valid id"))
        .transpose()?;

    if let Some(channel_id) = focus_channel {
        match client.load_channel(channel_id).await {
            Ok(count) => info!(%channel_id, count, "Loaded channel history"),
            Err(e) => warn!(%channel_id, error = %e, "Failed to load channel history"),
        }
    }

    let mut status = client.status_receiver();
    let mut notifications = client.notifications();
    let mut cache_updates = client.cache().subscribe();

    client.connect();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *status.borrow_and_update();
                info!(status = %state, "Connection status");
                if state == ConnectionState::Connected {
                    if let Some(channel_id) = focus_channel {
                        client.send_subscription_update(&SubscriptionIntent::channel(channel_id));
                    }
                }
            }
            notification = notifications.recv() => match notification {
                Ok(notification) => info!(?notification, "Channel list changed"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed channel notifications"),
                Err(RecvError::Closed) => break,
            },
            changed = cache_updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let channels = cache_updates.borrow_and_update().len();
                if let Some(channel_id) = focus_channel {
                    let messages = client.messages(channel_id);
                    if let Some(latest) = messages.last() {
                        info!(
                            %channel_id,
                            author = %latest.author_name,
                            preview = latest.preview(80),
                            total = messages.len(),
                            "Channel updated"
                        );
                    }
                } else {
                    info!(channels, "Message cache updated");
                }
            }
        }
    }

    client.disconnect();
    info!("Realtime client stopped");
    Ok(())
}
