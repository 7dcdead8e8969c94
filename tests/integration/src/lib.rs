//! Integration test utilities for the chat client
//!
//! This crate provides a stub WebSocket gateway and helpers for running
//! end-to-end tests of the realtime client against it and a stubbed REST API.

pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
