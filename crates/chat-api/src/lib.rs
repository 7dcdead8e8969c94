//! # chat-api
//!
//! REST client for the chat server. Implements [`chat_core::ChatApi`] on top
//! of `reqwest`, attaching the bearer token from the credential store.

pub mod client;

pub use client::ApiClient;
