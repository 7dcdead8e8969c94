//! In-memory credential store

use chat_core::CredentialStore;
use parking_lot::RwLock;

/// Process-local token holder
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a token
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Replace the stored token
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
        tracing::debug!("Auth token updated");
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn clear(&self) {
        if self.token.write().take().is_some() {
            tracing::debug!("Auth token cleared");
        }
    }
}
