use anyhow::Result;
use serde::Deserialize;
use std::env;

pub const DEFAULT_EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";
pub const DEFAULT_BIOC_BASE_URL: &str =
    "https://www.ncbi.nlm.nih.gov/research/bionlp/RESTful/pmcoa.cgi/BioC_xml/";
pub const DEFAULT_PMC_ARTICLE_BASE_URL: &str = "https://www.ncbi.nlm.nih.gov/pmc/articles/";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub embedding: EmbeddingConfig,
    pub vector: VectorConfig,
    pub pubmed: PubMedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub google_api_key: String,
    pub openai_api_key: String,
    pub default_provider: String,
    pub default_model: String,
}

impl LLMConfig {
    /// API key of the configured default provider. Empty keys are passed through;
    /// the provider reports the failure.
    pub fn active_api_key(&self) -> String {
        match self.default_provider.as_str() {
            "openai" => self.openai_api_key.clone(),
            _ => self.google_api_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorConfig {
    pub database_url: Option<String>,
    pub index_name: String,
    pub top_k: usize,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PubMedConfig {
    pub eutils_base_url: String,
    pub bioc_base_url: String,
    pub article_base_url: String,
    pub retmax: u32,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            eutils_base_url: DEFAULT_EUTILS_BASE_URL.to_string(),
            bioc_base_url: DEFAULT_BIOC_BASE_URL.to_string(),
            article_base_url: DEFAULT_PMC_ARTICLE_BASE_URL.to_string(),
            retmax: 10,
        }
    }
}

/// Checked in order; the first non-empty value wins.
pub const GOOGLE_API_KEY_VARS: [&str; 3] = [
    "GOOGLE_GENERATIVE_AI_API_KEY",
    "GOOGLE_API_KEY",
    "NEXT_PUBLIC_GOOGLE_GENERATIVE_AI_API_KEY",
];

fn first_set(names: &[&str], lookup: impl Fn(&str) -> Option<String>) -> String {
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "4111".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:4111".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            llm: LLMConfig {
                google_api_key: first_set(&GOOGLE_API_KEY_VARS, |name| env::var(name).ok()),
                openai_api_key: openai_api_key.clone(),
                default_provider: env::var("AGENT_LLM_PROVIDER")
                    .unwrap_or_else(|_| "google".to_string()),
                default_model: env::var("AGENT_LLM_MODEL")
                    .unwrap_or_else(|_| "gemini-2.0-flash-001".to_string()),
            },
            embedding: EmbeddingConfig {
                api_key: openai_api_key,
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            },
            vector: VectorConfig {
                database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
                index_name: env::var("VECTOR_INDEX_NAME").unwrap_or_else(|_| "papers".to_string()),
                top_k: env::var("VECTOR_TOP_K")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
            },
            pubmed: PubMedConfig {
                eutils_base_url: env::var("EUTILS_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_EUTILS_BASE_URL.to_string()),
                bioc_base_url: env::var("BIOC_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_BIOC_BASE_URL.to_string()),
                article_base_url: env::var("PMC_ARTICLE_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_PMC_ARTICLE_BASE_URL.to_string()),
                retmax: env::var("PUBMED_RETMAX")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
        })
    }
}
