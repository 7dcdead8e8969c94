//! REST collaborator - the slice of the chat HTTP API the realtime client needs

use async_trait::async_trait;

use crate::entities::{CachedMessage, Guild};
use crate::error::ApiResult;
use crate::value_objects::Snowflake;

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// List the guilds the authenticated user belongs to
    async fn current_user_guilds(&self) -> ApiResult<Vec<Guild>>;

    /// Fetch recent messages of a channel, already normalized for the cache
    async fn channel_messages(&self, channel_id: Snowflake) -> ApiResult<Vec<CachedMessage>>;
}
