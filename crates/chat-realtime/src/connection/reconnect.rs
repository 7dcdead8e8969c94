//! Bounded exponential-backoff reconnection

use std::time::Duration;

use chat_common::ReconnectSettings;

/// Reconnection policy applied when the server drops the connection
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Whether to automatically reconnect on disconnect
    pub enabled: bool,
    /// Initial delay before first reconnect attempt
    pub initial_delay: Duration,
    /// Maximum delay between reconnect attempts
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum number of reconnect attempts (None for unlimited)
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Policy that never reconnects
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Default backoff with reconnection switched on
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self.backoff_multiplier.powi(attempt.min(64) as i32);
        let delay_ms = self.initial_delay.as_millis() as f64 * multiplier;
        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }

        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }

    /// Check if another reconnect attempt should be made
    pub fn should_attempt(&self, attempt: u32) -> bool {
        if !self.enabled {
            return false;
        }
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }
}

impl From<&ReconnectSettings> for ReconnectPolicy {
    fn from(settings: &ReconnectSettings) -> Self {
        Self {
            enabled: settings.enabled,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            max_attempts: settings.max_attempts,
            ..Self::default()
        }
    }
}
