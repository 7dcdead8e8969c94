//! Error types for the realtime client

use chat_core::ApiError;
use thiserror::Error;

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(String),

    #[error("Transport is not open")]
    NotOpen,

    #[error("Transport task has stopped")]
    ChannelClosed,
}

/// Inbound or outbound frame that could not be processed
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame is not a JSON object")]
    NotAnObject,

    #[error("Frame has no numeric op code")]
    MissingOpCode,

    #[error("Invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },

    #[error("Invalid {kind} payload: {field} is zero")]
    ZeroId {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Hello frame has no positive heartbeat interval")]
    InvalidHeartbeatInterval,
}

/// Client-level errors returned by fallible public operations
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Realtime client is missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Result type for client operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;
