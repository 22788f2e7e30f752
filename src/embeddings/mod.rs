//! Embeddings and vector search
//!
//! - **openai**: `text-embedding-3-small` embeddings used to query the paper index
//! - **vector_search**: the `VectorStore` seam with pgvector and in-memory backends

pub mod openai;
pub mod vector_search;

pub use openai::OpenAIEmbedding;
pub use vector_search::*;

use async_trait::async_trait;
use crate::types::AppResult;

/// Turns text into a dense vector comparable against the paper index.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Model identifier, e.g. "text-embedding-3-small".
    fn model_name(&self) -> &str;
}

/// Collapses runs of whitespace so equivalent queries embed identically.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
