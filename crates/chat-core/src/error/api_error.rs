//! API errors - failures of REST calls against the chat server

use serde_json::Value;
use thiserror::Error;

/// REST API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server answered with a non-success status.
    ///
    /// `body` holds the decoded JSON body, or the raw text as a JSON string
    /// when the body was not JSON.
    #[error("API request failed with status {status}")]
    Status { status: u16, body: Option<Value> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error from a raw response body
    pub fn from_status(status: u16, raw_body: &str) -> Self {
        let body = if raw_body.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(raw_body)
                    .unwrap_or_else(|_| Value::String(raw_body.to_string())),
            )
        };
        Self::Status { status, body }
    }

    /// Get the HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the response body, if the server sent one
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Get an error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::Status { .. } => "HTTP_STATUS",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Check if this is a 4xx error
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    /// Check if this is a 5xx error
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }
}

/// Result type for REST operations
pub type ApiResult<T> = Result<T, ApiError>;
