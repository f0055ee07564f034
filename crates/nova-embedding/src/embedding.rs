//! SenseNova embedding provider

use async_trait::async_trait;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

use nova_client::{EmbeddingRequest, SenseNovaApi, SenseNovaClient, SenseNovaConfig};
use nova_core::{DEFAULT_EMBED_BATCH_SIZE, Embedding, EmbeddingProvider, Error, Result};

pub const DEFAULT_EMBEDDING_MODEL: &str = "nova-embedding-stable";
pub const DEFAULT_TASK_TYPE: &str = "retrieval_document";

/// Embedding provider backed by the SenseNova embeddings endpoint
///
/// Single-text lookups go straight to the vendor. Multi-text lookups issue
/// one vendor call per text, spaced at least `1 / rate_limit_per_second`
/// apart, measured from the end of the previous call. A failed call still
/// counts toward the spacing.
pub struct SenseNovaEmbedding<C = SenseNovaClient> {
    client: C,
    model_name: String,
    task_type: String,
    embed_batch_size: usize,
    rate_limit_per_second: NonZeroU32,
    last_request: Mutex<Option<Instant>>,
}

impl SenseNovaEmbedding<SenseNovaClient> {
    /// Create a provider using credentials from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(SenseNovaClient::from_env()?))
    }

    /// Create a provider from explicit credentials, falling back to the environment
    pub fn with_credentials(
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    ) -> Result<Self> {
        let config = SenseNovaConfig::resolve(access_key_id, secret_access_key)?;
        Ok(Self::new(SenseNovaClient::new(config)?))
    }
}

impl<C: SenseNovaApi> SenseNovaEmbedding<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            model_name: DEFAULT_EMBEDDING_MODEL.to_string(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            rate_limit_per_second: NonZeroU32::MIN,
            last_request: Mutex::new(None),
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    pub fn with_embed_batch_size(mut self, embed_batch_size: usize) -> Self {
        self.embed_batch_size = embed_batch_size.max(1);
        self
    }

    pub fn with_rate_limit_per_second(mut self, rate_limit_per_second: NonZeroU32) -> Self {
        self.rate_limit_per_second = rate_limit_per_second;
        self
    }

    /// Task tag describing how the vectors will be used
    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn rate_limit_per_second(&self) -> NonZeroU32 {
        self.rate_limit_per_second
    }

    /// Minimum spacing between throttled vendor calls
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_limit_per_second.get()))
    }

    async fn request_embedding(&self, text: &str) -> Result<Embedding> {
        let request = EmbeddingRequest {
            model: self.model_name.clone(),
            input: vec![text.to_string()],
        };

        let response = self.client.embeddings(&request).await?;

        response
            .embeddings
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| Error::EmptyResponse("SenseNova returned no embeddings".to_string()))
    }
}

#[async_trait]
impl<C: SenseNovaApi> EmbeddingProvider for SenseNovaEmbedding<C> {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embed_batch_size(&self) -> usize {
        self.embed_batch_size
    }

    async fn get_query_embedding(&self, query: &str) -> Result<Embedding> {
        self.request_embedding(query).await
    }

    async fn get_text_embedding(&self, text: &str) -> Result<Embedding> {
        self.request_embedding(text).await
    }

    async fn get_text_embeddings(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        // Held for the whole batch so concurrent batches cannot interleave calls.
        let mut last_request = self.last_request.lock().await;
        let min_interval = self.min_interval();
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            if let Some(last) = *last_request {
                let elapsed = last.elapsed();
                if elapsed < min_interval {
                    let wait = min_interval - elapsed;
                    debug!(wait_ms = wait.as_millis() as u64, "throttling embedding request");
                    sleep(wait).await;
                }
            }

            let result = self.request_embedding(text).await;
            *last_request = Some(Instant::now());
            embeddings.push(result?);
        }

        debug!(count = embeddings.len(), model = %self.model_name, "embedded batch");
        Ok(embeddings)
    }
}
