//! Research Assistant
//!
//! Answers questions about academic papers and technical documents using only the
//! content returned by the `vectorQueryTool`. Grounding is instruction-level; answers
//! are not checked against the retrieved chunks.

use super::{Agent, Tool};
use crate::llm::LLMAdapter;
use std::sync::Arc;

pub const RESEARCH_AGENT_NAME: &str = "Research Assistant";

pub const RESEARCH_AGENT_INSTRUCTIONS: &str = "You are a helpful research assistant that analyzes academic papers and technical documents.
Use the provided vector query tool to find relevant information from your knowledge base,
and provide accurate, well-supported answers based on the retrieved content.
Focus on the specific content available in the tool and acknowledge if you cannot find sufficient information to answer a question.
Base your responses only on the content provided, not on general knowledge.";

pub fn research_agent(llm: Arc<dyn LLMAdapter>, model: &str, vector_query_tool: Arc<dyn Tool>) -> Agent {
    Agent::new(RESEARCH_AGENT_NAME, RESEARCH_AGENT_INSTRUCTIONS, llm, model)
        .with_tool(vector_query_tool)
        .with_max_tokens(2048)
        .with_temperature(0.3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::ScriptedLLM;
    use crate::agents::tools::VECTOR_QUERY_TOOL_ID;
    use crate::agents::VectorQueryTool;
    use crate::embeddings::{EmbeddingProvider, InMemoryVectorStore, VectorRecord};
    use crate::types::{AppResult, LLMMessage};
    use async_trait::async_trait;

    struct ConstantEmbedding;

    #[async_trait]
    impl EmbeddingProvider for ConstantEmbedding {
        async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn model_name(&self) -> &str {
            "constant"
        }
    }

    #[tokio::test]
    async fn test_research_agent_retrieves_before_answering() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(
                "papers",
                vec![VectorRecord {
                    id: "chunk-1".to_string(),
                    embedding: vec![1.0, 0.0],
                    metadata: serde_json::json!({ "text": "Transformers use self-attention." }),
                }],
            )
            .await
            .unwrap();
        let tool = Arc::new(VectorQueryTool::new(
            Arc::new(ConstantEmbedding),
            Arc::new(store),
            "papers",
            3,
        ));

        let llm = Arc::new(ScriptedLLM::new(vec![
            r#"{"tool": "vectorQueryTool", "arguments": {"queryText": "attention"}}"#,
            "Transformers rely on self-attention.",
        ]));
        let agent = research_agent(llm.clone(), "gemini-2.0-flash-001", tool);

        assert_eq!(agent.name(), RESEARCH_AGENT_NAME);
        assert_eq!(agent.tool_ids(), vec![VECTOR_QUERY_TOOL_ID]);

        let response = agent
            .generate(vec![LLMMessage::user("What mechanism do transformers use?")])
            .await
            .unwrap();

        assert_eq!(response.text, "Transformers rely on self-attention.");
        let context = &response.steps[0].tool_result.as_ref().unwrap()["relevantContext"];
        assert_eq!(context[0]["text"], "Transformers use self-attention.");

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].model, "gemini-2.0-flash-001");
        assert!(requests[0]
            .system_instruction
            .as_deref()
            .unwrap()
            .contains("Base your responses only on the content provided"));
    }
}
