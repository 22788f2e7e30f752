use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::agents::{mesh_term_agent, research_agent, Agent, VectorQueryTool};
use crate::config::Config;
use crate::embeddings::{InMemoryVectorStore, OpenAIEmbedding, PgVectorStore, VectorStore};
use crate::llm::{LLMAdapter, LLMProviderConfig, LLM};
use crate::search::PubMedClient;
use crate::types::{AppResult, LLMMessage};
use crate::workflow::ResearchWorkflow;

/// Shared handler state: the research agent and the PubMed workflow.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: Option<PgPool>,
    pub agent: Arc<Agent>,
    pub workflow: Arc<ResearchWorkflow>,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: Option<PgPool>,
        agent: Arc<Agent>,
        workflow: Arc<ResearchWorkflow>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pool,
            agent,
            workflow,
        }
    }

    /// Wires the LLM, embedder, vector store, agents and PubMed client from configuration.
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let llm = LLM::new(LLMProviderConfig::from_config(&config.llm))?;
        info!(provider = %llm.provider(), model = %config.llm.default_model, "LLM provider ready");
        let llm: Arc<dyn LLMAdapter> = Arc::new(llm);

        let pool = crate::db::create_pool(&config.vector).await?;
        let store: Arc<dyn VectorStore> = match &pool {
            Some(pool) => {
                info!(index = %config.vector.index_name, "Using pgvector store");
                Arc::new(PgVectorStore::new(pool.clone()))
            }
            None => {
                warn!("DATABASE_URL not set, vector queries will run against an empty in-memory store");
                Arc::new(InMemoryVectorStore::new())
            }
        };

        let tool = VectorQueryTool::new(
            Arc::new(OpenAIEmbedding::from_config(&config.embedding)),
            store,
            config.vector.index_name.clone(),
            config.vector.top_k,
        );

        let agent = research_agent(llm.clone(), &config.llm.default_model, Arc::new(tool));
        let term_agent = mesh_term_agent(llm, &config.llm.default_model);
        let workflow = ResearchWorkflow::new(
            Arc::new(term_agent),
            Arc::new(PubMedClient::new(&config.pubmed)),
        );

        Ok(Self::new(config, pool, Arc::new(agent), Arc::new(workflow)))
    }
}

// API request/response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub messages: Vec<LLMMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub vector_store: String,
}
