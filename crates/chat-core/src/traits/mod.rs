//! Traits (ports) implemented by the infrastructure crates

mod api;
mod credentials;

pub use api::ChatApi;
pub use credentials::CredentialStore;
