//! Shared test doubles for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pubmed_research::agents::{mesh_term_agent, Agent};
use pubmed_research::config::PubMedConfig;
use pubmed_research::llm::LLMAdapter;
use pubmed_research::search::PubMedClient;
use pubmed_research::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
use pubmed_research::workflow::ResearchWorkflow;

/// Replays canned replies in order, repeating the last one once the script runs out.
pub struct StubLLM {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    pub calls: Mutex<usize>,
}

impl StubLLM {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LLMAdapter for StubLLM {
    async fn create_chat_completion(&self, _request: &LLMRequest) -> AppResult<LLMResponse> {
        *self.calls.lock().unwrap() += 1;

        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        let content = match next {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last
                .clone()
                .ok_or_else(|| AppError::LLMApi("stub has no replies".to_string()))?,
        };

        Ok(LLMResponse {
            content,
            finish_reason: "stop".to_string(),
            usage: TokenUsage::default(),
        })
    }
}

pub const CAFFEINE_TERMS: &str = r#"```json
{"parsedQuery":{"rawTerms":["caffeine","sleep"],"keyTerms":["Caffeine","Sleep"]}}
```"#;

pub fn pubmed_config(server_url: &str) -> PubMedConfig {
    PubMedConfig {
        eutils_base_url: format!("{}/entrez/eutils/", server_url),
        bioc_base_url: format!("{}/bioc/", server_url),
        ..Default::default()
    }
}

pub fn workflow(llm: Arc<StubLLM>, server_url: &str) -> ResearchWorkflow {
    let term_agent: Agent = mesh_term_agent(llm, "test-model");
    ResearchWorkflow::new(
        Arc::new(term_agent),
        Arc::new(PubMedClient::new(&pubmed_config(server_url))),
    )
}

pub fn esearch_body(ids: &[&str]) -> String {
    serde_json::json!({
        "header": { "type": "esearch", "version": "0.3" },
        "esearchresult": { "count": ids.len().to_string(), "idlist": ids }
    })
    .to_string()
}

pub fn esummary_body(ids: &[&str]) -> String {
    let mut result = serde_json::Map::new();
    result.insert("uids".to_string(), serde_json::json!(ids));
    for (i, id) in ids.iter().enumerate() {
        result.insert(
            id.to_string(),
            serde_json::json!({
                "uid": id,
                "title": format!("Caffeine and sleep study {}", i + 1),
                "authors": [{ "name": "Doe J", "authtype": "Author" }],
                "fulljournalname": "Journal of Sleep Research",
                "pubdate": "2021 Mar",
                "articleids": [
                    { "idtype": "pmid", "value": format!("3300{}", i) },
                    { "idtype": "pmcid", "value": format!("PMC{}", id) }
                ]
            }),
        );
    }
    serde_json::json!({ "result": result }).to_string()
}
