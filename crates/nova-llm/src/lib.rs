//! SenseNova chat models for the host's language-model contract

mod llm;


pub use llm::{
    DEFAULT_MODEL, DEFAULT_SENSENOVA_MAX_TOKENS, DEFAULT_TEMPERATURE, MODEL_CONTEXT_WINDOWS,
    SenseNova, context_window_for, supported_models,
};

// Re-export core types for convenience
pub use nova_core::{
    ChatMessage, ChatResponse, CompletionResponse, CompletionResponseStream, Error, LLMMetadata,
    LanguageModel, MessageRole, Result,
};
