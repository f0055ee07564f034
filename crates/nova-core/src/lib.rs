//! Core traits and types for the SenseNova adapters
//!
//! This crate defines the contracts a retrieval-augmented-generation host
//! expects from its model providers: an embedding provider and a language
//! model. The adapter crates implement these against the SenseNova API.

pub mod embedding;
pub mod error;
pub mod llm;


pub use embedding::{DEFAULT_EMBED_BATCH_SIZE, Embedding, EmbeddingProvider};
pub use error::{Error, Result};
pub use llm::{
    ChatMessage, ChatResponse, CompletionResponse, CompletionResponseStream, LLMMetadata,
    LanguageModel, MessageRole,
};
