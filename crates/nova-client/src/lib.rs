//! SenseNova API client
//!
//! This crate talks to the SenseNova chat-completion and embedding endpoints.
//! Adapters depend on the [`SenseNovaApi`] trait rather than the HTTP client
//! so they can be exercised against in-memory fakes.

mod auth;
mod client;
mod config;
mod types;

#[cfg(test)]
mod test_support;

pub use auth::generate_token;
pub use client::{ChatCompletionStream, SenseNovaApi, SenseNovaClient};
pub use config::{DEFAULT_API_BASE, SenseNovaConfig};
pub use types::{
    ChatChoice, ChatCompletionChunk, ChatCompletionData, ChatCompletionRequest,
    ChatCompletionResponse, EmbeddingData, EmbeddingRequest, EmbeddingResponse, Message, Usage,
};

// Re-export core types for convenience
pub use nova_core::{Error, Result};
