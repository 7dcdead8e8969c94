//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub gateway: GatewayConfig,
    pub api: ApiConfig,
    pub reconnect: ReconnectSettings,
    /// Token to seed the credential store with
    pub auth_token: Option<String>,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(()),
        }
    }
}

/// Realtime gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// WebSocket URL of the gateway
    pub url: String,
    /// Base URL server-relative attachment paths are resolved against
    pub attachment_base_url: String,
}

/// REST API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Automatic reconnection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectSettings {
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay_ms: default_reconnect_initial_delay(),
            max_delay_ms: default_reconnect_max_delay(),
            max_attempts: None,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-client".to_string()
}

fn default_attachment_base_url() -> String {
    "http://localhost".to_string()
}

fn default_api_timeout() -> u64 {
    10
}

fn default_reconnect_initial_delay() -> u64 {
    500
}

fn default_reconnect_max_delay() -> u64 {
    30_000
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// # Errors
    /// Returns an error if required variables are missing or malformed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        Ok(Self {
            app: AppSettings {
                name: vars.string("APP_NAME").unwrap_or_else(default_app_name),
                env: vars.parse("APP_ENV")?.unwrap_or_default(),
            },
            gateway: GatewayConfig {
                url: vars.required("GATEWAY_URL")?,
                attachment_base_url: vars
                    .string("ATTACHMENT_BASE_URL")
                    .unwrap_or_else(default_attachment_base_url),
            },
            api: ApiConfig {
                base_url: vars.required("API_BASE_URL")?,
                timeout_secs: vars
                    .parse("API_TIMEOUT_SECS")?
                    .unwrap_or_else(default_api_timeout),
            },
            reconnect: ReconnectSettings {
                enabled: vars.parse("RECONNECT_ENABLED")?.unwrap_or(false),
                initial_delay_ms: vars
                    .parse("RECONNECT_INITIAL_DELAY_MS")?
                    .unwrap_or_else(default_reconnect_initial_delay),
                max_delay_ms: vars
                    .parse("RECONNECT_MAX_DELAY_MS")?
                    .unwrap_or_else(default_reconnect_max_delay),
                max_attempts: vars.parse("RECONNECT_MAX_ATTEMPTS")?,
            },
            auth_token: vars.string("AUTH_TOKEN"),
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-blank value of a variable
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.string(name).ok_or(ConfigError::MissingVar(name))
    }

    fn parse<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ConfigError> {
        self.string(name)
            .map(|s| {
                s.parse()
                    .map_err(|_| ConfigError::InvalidValue(name, s.clone()))
            })
            .transpose()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
