//! Credential source for authenticating against the gateway and REST API

/// Holds the session token of the signed-in user
pub trait CredentialStore: Send + Sync {
    /// Current auth token, if signed in
    fn token(&self) -> Option<String>;

    /// Forget the stored token
    fn clear(&self);
}
