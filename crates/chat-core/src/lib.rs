//! # chat-core
//!
//! Domain layer containing snowflake ids, chat records, API errors, and the
//! collaborator traits the realtime client is wired against.
//! This crate has zero dependencies on infrastructure (HTTP, WebSocket, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Attachment, AuthorRecord, CachedMessage, Channel, ChannelType, Guild, MessageRecord,
    CONTENT_TYPE_PLACEHOLDER,
};
pub use error::{ApiError, ApiResult};
pub use traits::{ChatApi, CredentialStore};
pub use value_objects::{Snowflake, SnowflakeParseError};
