//! Client for the AI learning assistant endpoint.
//!
//! The remote contract is opaque and deliberately small: one POST with a
//! prompt, one JSON reply, no streaming. Without a configured endpoint the
//! client answers locally so the assistant panel always has something to
//! say.

mod client;
mod retry;

pub use client::{AssistantClient, FALLBACK_REPLY};
pub use retry::RetryConfig;
