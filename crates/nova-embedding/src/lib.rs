//! SenseNova embeddings for the host's embedding-provider contract

mod embedding;

pub use embedding::{DEFAULT_EMBEDDING_MODEL, DEFAULT_TASK_TYPE, SenseNovaEmbedding};

// Re-export core types for convenience
pub use nova_core::{Embedding, EmbeddingProvider, Error, Result};
