//! Guild entity - represents a server the current user belongs to

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Guild (server) as listed by `GET /user/me/guilds`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Snowflake>,
    #[serde(default)]
    pub public: bool,
}

impl Guild {
    /// Create a guild with only an id and a name
    #[must_use]
    pub fn new(id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            icon: None,
            owner: None,
            public: false,
        }
    }
}
