//! Language model trait and types

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Role of a chat participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Result of a completion request
///
/// When produced by a stream, `text` holds only that chunk's increment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub raw: Option<serde_json::Value>,
}

/// Result of a chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub raw: Option<serde_json::Value>,
}

/// Lazy, finite sequence of incremental completion chunks
pub type CompletionResponseStream = Pin<Box<dyn Stream<Item = Result<CompletionResponse>> + Send>>;

/// Static description of a model, used by the host to size prompts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LLMMetadata {
    pub context_window: u32,
    pub num_output: u32,
    pub model_name: String,
    pub is_chat_model: bool,
}

/// Trait for language models
///
/// Calls are independent and stateless; an implementation may be shared
/// freely between tasks.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Describe the configured model
    fn metadata(&self) -> LLMMetadata;

    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse>;

    /// Complete a single prompt, yielding text as the model produces it
    async fn stream_complete(&self, prompt: &str) -> Result<CompletionResponseStream>;

    /// Continue a conversation
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse>;
}
