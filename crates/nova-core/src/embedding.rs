//! Embedding provider trait and types

use async_trait::async_trait;

use crate::Result;

/// Number of texts handed to a provider per batch call unless configured otherwise
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 10;

/// A single embedding vector
pub type Embedding = Vec<f32>;

/// Trait for embedding providers
///
/// The host calls the query/text methods for single inputs and
/// [`get_text_embedding_batch`](EmbeddingProvider::get_text_embedding_batch)
/// when indexing, which splits the input into chunks of
/// [`embed_batch_size`](EmbeddingProvider::embed_batch_size) and hands each
/// chunk to [`get_text_embeddings`](EmbeddingProvider::get_text_embeddings).
/// Every method preserves input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the model identifier
    fn model_name(&self) -> &str;

    /// Maximum number of texts passed to a single `get_text_embeddings` call
    fn embed_batch_size(&self) -> usize {
        DEFAULT_EMBED_BATCH_SIZE
    }

    /// Embed a search query
    async fn get_query_embedding(&self, query: &str) -> Result<Embedding>;

    /// Embed a single document text
    async fn get_text_embedding(&self, text: &str) -> Result<Embedding>;

    /// Embed several texts, one vector per text in input order
    async fn get_text_embeddings(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Embed an arbitrary number of texts in chunks of `embed_batch_size`
    async fn get_text_embedding_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let batch_size = self.embed_batch_size().max(1);
        let mut embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(batch_size) {
            embeddings.extend(self.get_text_embeddings(chunk).await?);
        }

        Ok(embeddings)
    }
}
