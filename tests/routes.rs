mod common;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::assert_ok;
use tower::ServiceExt;

use common::*;
use pubmed_research::agents::{research_agent, VectorQueryTool};
use pubmed_research::config::{
    Config, EmbeddingConfig, LLMConfig, PubMedConfig, ServerConfig, VectorConfig,
};
use pubmed_research::embeddings::{EmbeddingProvider, InMemoryVectorStore, VectorRecord};
use pubmed_research::types::AppResult;
use pubmed_research::{create_router, AppState};

struct FixedEmbedding;

#[async_trait]
impl EmbeddingProvider for FixedEmbedding {
    async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

fn test_config(pubmed: PubMedConfig) -> Config {
    Config {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
        },
        llm: LLMConfig {
            google_api_key: String::new(),
            openai_api_key: String::new(),
            default_provider: "google".to_string(),
            default_model: "test-model".to_string(),
        },
        embedding: EmbeddingConfig {
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
        },
        vector: VectorConfig {
            database_url: None,
            index_name: "papers".to_string(),
            top_k: 3,
            max_connections: 1,
        },
        pubmed,
    }
}

async fn app(agent_replies: &[&str], workflow_replies: &[&str], server_url: &str) -> axum::Router {
    let store = InMemoryVectorStore::new();
    assert_ok!(
        store
            .upsert(
                "papers",
                vec![VectorRecord {
                    id: "chunk-1".to_string(),
                    embedding: vec![1.0, 0.0],
                    metadata: json!({ "text": "Caffeine delays sleep onset by about 20 minutes." }),
                }],
            )
            .await
    );
    let tool = VectorQueryTool::new(Arc::new(FixedEmbedding), Arc::new(store), "papers", 3);
    let agent = research_agent(Arc::new(StubLLM::new(agent_replies)), "test-model", Arc::new(tool));

    let state = AppState::new(
        test_config(pubmed_config(server_url)),
        None,
        Arc::new(agent),
        Arc::new(workflow(Arc::new(StubLLM::new(workflow_replies)), server_url)),
    );
    create_router(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(&["unused"], &["unused"], "http://127.0.0.1:9").await;

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["vector_store"], "in-memory");
}

#[tokio::test]
async fn test_generate_runs_vector_tool_then_answers() {
    let app = app(
        &[
            r#"{"tool":"vectorQueryTool","arguments":{"queryText":"caffeine sleep latency"}}"#,
            "Caffeine delays sleep onset by about 20 minutes.",
        ],
        &["unused"],
        "http://127.0.0.1:9",
    )
    .await;

    let response = app
        .oneshot(post_json(
            "/api/agents/research/generate",
            json!({ "messages": [{ "role": "user", "content": "How does caffeine affect sleep?" }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"], "Caffeine delays sleep onset by about 20 minutes.");
    assert_eq!(body["steps"].as_array().unwrap().len(), 2);
    assert_eq!(body["steps"][0]["toolCall"]["tool"], "vectorQueryTool");
    assert_eq!(body["steps"][0]["toolResult"]["sources"][0]["id"], "chunk-1");
}

#[tokio::test]
async fn test_generate_rejects_empty_messages() {
    let app = app(&["unused"], &["unused"], "http://127.0.0.1:9").await;

    let response = app
        .oneshot(post_json("/api/agents/research/generate", json!({ "messages": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("messages"));
}

#[tokio::test]
async fn test_workflow_run_returns_result_and_steps() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/entrez/eutils/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_body(esearch_body(&["111"]))
        .create_async()
        .await;
    server
        .mock("GET", "/entrez/eutils/esummary.fcgi")
        .match_query(Matcher::Any)
        .with_body(esummary_body(&["111"]))
        .create_async()
        .await;
    server
        .mock("GET", "/bioc/PMC111/unicode")
        .with_body("<collection/>")
        .create_async()
        .await;

    let app = app(&["unused"], &[CAFFEINE_TERMS], &server.url()).await;

    let response = app
        .oneshot(post_json(
            "/api/workflows/pubmed-research/run",
            json!({ "query": "effects of caffeine on sleep" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["workflow"], "pubmed-research-workflow");
    assert_eq!(body["result"]["parsedQuery"]["keyTerms"], json!(["Caffeine", "Sleep"]));
    assert_eq!(body["result"]["articles"][0]["pmcid"], "111");
    assert_eq!(body["result"]["articles"][0]["journal"], "Journal of Sleep Research");
    assert!(body["result"]["note"].is_null());
    assert_eq!(body["steps"].as_array().unwrap().len(), 4);
    assert_eq!(body["steps"][3]["stepId"], "structureResponse");
}

#[tokio::test]
async fn test_workflow_run_without_query_is_rejected() {
    let app = app(&["unused"], &["unused"], "http://127.0.0.1:9").await;

    let response = app
        .oneshot(post_json("/api/workflows/pubmed-research/run", json!({ "question": "?" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
