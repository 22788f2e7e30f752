use async_trait::async_trait;
use std::sync::Arc;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Provider name, credentials and endpoint used to build an [`LLM`].
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    /// Overrides the provider's public endpoint (proxies, local mocks).
    pub base_url: Option<String>,
}

impl LLMProviderConfig {
    pub fn from_config(config: &crate::config::LLMConfig) -> Self {
        Self {
            name: config.default_provider.clone(),
            api_key: config.active_api_key(),
            base_url: None,
        }
    }
}

#[derive(Clone)]
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider: LLMProvider,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let kind = LLMProvider::parse(&provider.name).ok_or_else(|| {
            AppError::Config(format!("Unsupported provider: {}", provider.name))
        })?;

        let adapter: Arc<dyn LLMAdapter> = match (kind, provider.base_url) {
            (LLMProvider::Google, None) => {
                Arc::new(crate::llm::google::GoogleAdapter::new(&provider.api_key))
            }
            (LLMProvider::Google, Some(base)) => Arc::new(
                crate::llm::google::GoogleAdapter::new_with_api_base(&provider.api_key, &base),
            ),
            (LLMProvider::OpenAI, None) => {
                Arc::new(crate::llm::openai::OpenAIAdapter::new(&provider.api_key))
            }
            (LLMProvider::OpenAI, Some(base)) => Arc::new(
                crate::llm::openai::OpenAIAdapter::new_with_api_base(&provider.api_key, &base),
            ),
        };

        Ok(Self {
            adapter,
            provider: kind,
        })
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn adapter(&self) -> Arc<dyn LLMAdapter> {
        self.adapter.clone()
    }
}

#[async_trait]
impl LLMAdapter for LLM {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
