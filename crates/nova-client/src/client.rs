//! SenseNova API client implementation

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, future};
use reqwest::{Client, Response};
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use nova_core::{Error, Result};

use crate::auth::generate_token;
use crate::config::SenseNovaConfig;
use crate::types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest,
    EmbeddingResponse, ErrorEnvelope,
};

/// Chunks of a streaming chat completion, ending when the server sends `[DONE]`
pub type ChatCompletionStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// Operations the adapters need from SenseNova
#[async_trait]
pub trait SenseNovaApi: Send + Sync {
    /// Run a chat completion and wait for the whole answer
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse>;

    /// Run a chat completion as a server-sent event stream
    async fn chat_completion_stream(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionStream>;

    /// Embed every string in `request.input`
    async fn embeddings(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse>;
}

#[async_trait]
impl<T: SenseNovaApi + ?Sized> SenseNovaApi for Arc<T> {
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        (**self).chat_completion(request).await
    }

    async fn chat_completion_stream(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionStream> {
        (**self).chat_completion_stream(request).await
    }

    async fn embeddings(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        (**self).embeddings(request).await
    }
}

/// HTTP client for the SenseNova API
///
/// Each instance carries its own credentials, so clients for different
/// accounts can coexist.
#[derive(Debug, Clone)]
pub struct SenseNovaClient {
    config: SenseNovaConfig,
    client: Client,
}

impl SenseNovaClient {
    /// Create a new client from configuration
    pub fn new(config: SenseNovaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(SenseNovaConfig::from_env()?)
    }

    pub fn config(&self) -> &SenseNovaConfig {
        &self.config
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let token = generate_token(&self.config.access_key_id, &self.config.secret_access_key)?;
        let url = self.config.endpoint(path);

        debug!(%url, "sending SenseNova request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response)
    }
}

/// Turn a non-success response into `Error::Api`, keeping the vendor's code and message
async fn api_error(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => Error::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => Error::Api {
            status,
            code: None,
            message: body,
        },
    }
}

/// Parse one SSE payload; an `error` object inside the stream becomes `Error::Api`
fn parse_chunk(data: &str) -> Result<ChatCompletionChunk> {
    let value: serde_json::Value = serde_json::from_str(data)?;

    if value.get("error").is_some() {
        let envelope: ErrorEnvelope = serde_json::from_value(value)?;
        return Err(Error::Api {
            status: 200,
            code: envelope.error.code,
            message: envelope.error.message,
        });
    }

    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl SenseNovaApi for SenseNovaClient {
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let response = self.post("chat-completions", request).await?;

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    async fn chat_completion_stream(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionStream> {
        let mut request = request.clone();
        request.stream = true;

        let response = self.post("chat-completions", &request).await?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                future::ready(!matches!(event, Ok(event) if event.data.trim() == "[DONE]"))
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(parse_chunk(&event.data)),
                    Err(e) => Some(Err(Error::Network(format!("Stream error: {e}")))),
                })
            });

        Ok(Box::pin(stream))
    }

    async fn embeddings(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        let response = self.post("embeddings", request).await?;

        response
            .json::<EmbeddingResponse>()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}
