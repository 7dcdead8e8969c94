//! Configuration structs

mod client_config;

pub use client_config::{
    ApiConfig, AppSettings, ClientConfig, ConfigError, Environment, GatewayConfig,
    ReconnectSettings,
};
