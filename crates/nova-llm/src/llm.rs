//! SenseNova chat model

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value};
use tracing::debug;

use nova_client::{
    ChatCompletionRequest, ChatCompletionResponse, Message, SenseNovaApi, SenseNovaClient,
    SenseNovaConfig,
};
use nova_core::{
    ChatMessage, ChatResponse, CompletionResponse, CompletionResponseStream, Error, LLMMetadata,
    LanguageModel, Result,
};

/// Ceiling and default for generated tokens
pub const DEFAULT_SENSENOVA_MAX_TOKENS: u32 = 512;
pub const DEFAULT_MODEL: &str = "SenseChat-32K";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Supported models and their context windows in tokens
pub const MODEL_CONTEXT_WINDOWS: &[(&str, u32)] = &[
    ("SenseChat-5", 131_072),
    ("SenseChat", 4_096),
    ("SenseChat-32K", 131_072),
    ("SenseChat-128K", 131_072),
    ("SenseChat-Turbo", 32_768),
    ("SenseChat-5-Cantonese", 32_768),
];

/// Request fields owned by the adapter; extra parameters cannot override them
const RESERVED_PARAMS: &[&str] = &["model", "messages", "max_new_tokens", "temperature", "stream"];

pub fn context_window_for(model: &str) -> Option<u32> {
    MODEL_CONTEXT_WINDOWS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, window)| *window)
}

pub fn supported_models() -> impl Iterator<Item = &'static str> {
    MODEL_CONTEXT_WINDOWS.iter().map(|(name, _)| *name)
}

fn validate_model(model: &str) -> Result<u32> {
    context_window_for(model).ok_or_else(|| Error::UnsupportedModel {
        model: model.to_string(),
        supported: supported_models().map(str::to_string).collect(),
    })
}

fn effective_max_tokens(requested: Option<u32>) -> u32 {
    match requested {
        None | Some(0) => DEFAULT_SENSENOVA_MAX_TOKENS,
        Some(tokens) => tokens.min(DEFAULT_SENSENOVA_MAX_TOKENS),
    }
}

/// SenseNova chat model
///
/// The model is checked against [`MODEL_CONTEXT_WINDOWS`] when the adapter
/// is built, so an instance always knows its context window.
pub struct SenseNova<C = SenseNovaClient> {
    client: C,
    model: String,
    context_window: u32,
    temperature: f32,
    max_tokens: u32,
    generate_kwargs: Map<String, Value>,
}

impl SenseNova<SenseNovaClient> {
    /// Create a model using credentials from the environment
    pub fn from_env(model: &str, max_tokens: Option<u32>) -> Result<Self> {
        Self::with_credentials(None, None, model, max_tokens)
    }

    /// Create a model from explicit credentials, falling back to the environment
    pub fn with_credentials(
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        model: &str,
        max_tokens: Option<u32>,
    ) -> Result<Self> {
        validate_model(model)?;
        let config = SenseNovaConfig::resolve(access_key_id, secret_access_key)?;
        Self::new(SenseNovaClient::new(config)?, model, max_tokens)
    }
}

impl<C: SenseNovaApi> SenseNova<C> {
    /// Create a model on top of an existing client
    ///
    /// `max_tokens` of `None` or `0` selects [`DEFAULT_SENSENOVA_MAX_TOKENS`];
    /// larger values are clamped to it.
    pub fn new(client: C, model: impl Into<String>, max_tokens: Option<u32>) -> Result<Self> {
        let model = model.into();
        let context_window = validate_model(&model)?;

        Ok(Self {
            client,
            model,
            context_window,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: effective_max_tokens(max_tokens),
            generate_kwargs: Map::new(),
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Add a vendor parameter sent with every request
    pub fn with_generate_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.generate_kwargs.insert(key.into(), value.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Complete a prompt with extra vendor parameters for this call only
    ///
    /// Per-call parameters take precedence over the ones set with
    /// [`with_generate_kwarg`](Self::with_generate_kwarg).
    pub async fn complete_with(
        &self,
        prompt: &str,
        kwargs: &Map<String, Value>,
    ) -> Result<CompletionResponse> {
        debug!(model = %self.model, "completing prompt");

        let request = self.build_request(vec![Message::new("user", prompt)], kwargs);
        let response = self.client.chat_completion(&request).await?;
        let text = top_message(&response)?;

        Ok(CompletionResponse {
            text,
            raw: Some(serde_json::to_value(&response)?),
        })
    }

    pub async fn stream_complete_with(
        &self,
        prompt: &str,
        kwargs: &Map<String, Value>,
    ) -> Result<CompletionResponseStream> {
        debug!(model = %self.model, "streaming completion");

        let mut request = self.build_request(vec![Message::new("user", prompt)], kwargs);
        request.stream = true;

        let chunks = self.client.chat_completion_stream(&request).await?;
        let stream = chunks.map(|chunk| -> Result<CompletionResponse> {
            let chunk = chunk?;
            Ok(CompletionResponse {
                text: chunk.first_message().unwrap_or_default().to_string(),
                raw: Some(serde_json::to_value(&chunk)?),
            })
        });

        Ok(Box::pin(stream))
    }

    pub async fn chat_with(
        &self,
        messages: &[ChatMessage],
        kwargs: &Map<String, Value>,
    ) -> Result<ChatResponse> {
        if messages.is_empty() {
            return Err(Error::InvalidInput("chat needs at least one message".to_string()));
        }

        debug!(model = %self.model, turns = messages.len(), "sending chat");

        let messages = messages
            .iter()
            .map(|msg| Message::new(msg.role.as_str(), msg.content.clone()))
            .collect();

        let response = self
            .client
            .chat_completion(&self.build_request(messages, kwargs))
            .await?;
        let text = top_message(&response)?;

        Ok(ChatResponse {
            message: ChatMessage::assistant(text),
            raw: Some(serde_json::to_value(&response)?),
        })
    }

    fn build_request(&self, messages: Vec<Message>, kwargs: &Map<String, Value>) -> ChatCompletionRequest {
        let mut extra = self.generate_kwargs.clone();
        extra.extend(kwargs.iter().map(|(key, value)| (key.clone(), value.clone())));
        extra.retain(|key, _| !RESERVED_PARAMS.contains(&key.as_str()));

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_new_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            stream: false,
            extra,
        }
    }
}

fn top_message(response: &ChatCompletionResponse) -> Result<String> {
    response
        .first_message()
        .map(str::to_string)
        .ok_or_else(|| Error::EmptyResponse("SenseNova returned no choices".to_string()))
}

#[async_trait]
impl<C: SenseNovaApi> LanguageModel for SenseNova<C> {
    fn metadata(&self) -> LLMMetadata {
        LLMMetadata {
            context_window: self.context_window,
            num_output: self.max_tokens,
            model_name: self.model.clone(),
            is_chat_model: true,
        }
    }

    async fn complete(&self, prompt: &str) -> Result<CompletionResponse> {
        self.complete_with(prompt, &Map::new()).await
    }

    async fn stream_complete(&self, prompt: &str) -> Result<CompletionResponseStream> {
        self.stream_complete_with(prompt, &Map::new()).await
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse> {
        self.chat_with(messages, &Map::new()).await
    }
}
