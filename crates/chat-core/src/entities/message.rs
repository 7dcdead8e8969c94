//! Message entity - represents a chat message as the client caches it

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Content type attached to attachments the server did not describe
pub const CONTENT_TYPE_PLACEHOLDER: &str = "unknown";

/// A message as held in the local message cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub content: String,
    /// ISO-8601 creation time
    pub timestamp: String,
    pub attachments: Vec<Attachment>,
}

impl CachedMessage {
    /// Get a truncated preview of the message (for notifications)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }
}

/// File attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Attachment {
    /// Rewrite a server-relative URL against `base_url` and fill in a
    /// placeholder content type when the server sent none.
    #[must_use]
    pub fn qualified(mut self, base_url: &str) -> Self {
        if !is_absolute_url(&self.url) {
            self.url = format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                self.url.trim_start_matches('/')
            );
        }
        if self.content_type.trim().is_empty() {
            self.content_type = CONTENT_TYPE_PLACEHOLDER.to_string();
        }
        self
    }
}

fn is_absolute_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Message author as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub id: Snowflake,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Message as delivered by both the REST API and realtime events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author: AuthorRecord,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl MessageRecord {
    /// Name of the first required id that is zero, if any
    #[must_use]
    pub fn zero_id_field(&self) -> Option<&'static str> {
        if self.id.is_zero() {
            Some("id")
        } else if self.channel_id.is_zero() {
            Some("channel_id")
        } else if self.author.id.is_zero() {
            Some("author.id")
        } else {
            None
        }
    }

    /// Normalize into the cached representation.
    ///
    /// Attachments are qualified against `attachment_base_url`; a missing
    /// timestamp is derived from the id's embedded creation time.
    #[must_use]
    pub fn into_cached(self, attachment_base_url: &str) -> CachedMessage {
        let timestamp = self.timestamp.unwrap_or_else(|| {
            self.id
                .created_at()
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        });

        CachedMessage {
            id: self.id,
            channel_id: self.channel_id,
            author_id: self.author.id,
            author_name: self.author.name,
            author_avatar_url: self.author.avatar_url,
            content: self.content.unwrap_or_default(),
            timestamp,
            attachments: self
                .attachments
                .into_iter()
                .map(|a| a.qualified(attachment_base_url))
                .collect(),
        }
    }
}
