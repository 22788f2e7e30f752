//! Agent tools.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::embeddings::{EmbeddingProvider, VectorMatch, VectorStore};
use crate::types::{AppError, AppResult};

pub const VECTOR_QUERY_TOOL_ID: &str = "vectorQueryTool";

#[async_trait]
pub trait Tool: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    /// Argument shape advertised to the model.
    fn parameters(&self) -> Value;

    async fn execute(&self, arguments: Value) -> AppResult<Value>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorQueryArgs {
    pub query_text: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorQueryOutput {
    /// Metadata of each hit, most similar first.
    pub relevant_context: Vec<Value>,
    pub sources: Vec<VectorMatch>,
}

/// Semantic search over the paper embeddings index.
pub struct VectorQueryTool {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    index_name: String,
    top_k: usize,
}

impl VectorQueryTool {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        index_name: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            index_name: index_name.into(),
            top_k: top_k.max(1),
        }
    }

    pub async fn query(&self, args: VectorQueryArgs) -> AppResult<VectorQueryOutput> {
        let top_k = args.top_k.unwrap_or(self.top_k).max(1);
        info!(index = %self.index_name, top_k, query = %args.query_text, "Querying paper index");

        let embedding = self.embedder.embed(&args.query_text).await?;
        let sources = self.store.query(&self.index_name, &embedding, top_k).await?;

        Ok(VectorQueryOutput {
            relevant_context: sources.iter().map(|s| s.metadata.clone()).collect(),
            sources,
        })
    }
}

#[async_trait]
impl Tool for VectorQueryTool {
    fn id(&self) -> &str {
        VECTOR_QUERY_TOOL_ID
    }

    fn description(&self) -> &str {
        "Access the knowledge base to find information needed to answer user questions. \
         Performs semantic search over the indexed paper embeddings."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "queryText": "string, the text to search the knowledge base for",
            "topK": format!("optional integer, number of results (default {})", self.top_k)
        })
    }

    async fn execute(&self, arguments: Value) -> AppResult<Value> {
        let args: VectorQueryArgs = serde_json::from_value(arguments)
            .map_err(|e| AppError::InvalidRequest(format!("invalid {} arguments: {}", VECTOR_QUERY_TOOL_ID, e)))?;
        let output = self.query(args).await?;
        Ok(serde_json::to_value(output)?)
    }
}
