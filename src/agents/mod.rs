//! Agent System
//!
//! An [`Agent`] binds a language model to a fixed instruction string and a set of tools:
//!
//! - **Research Assistant** (`research`): answers questions from the paper index through
//!   the `vectorQueryTool`
//! - **MeSH Term Agent** (`mesh_terms`): turns a free-text question into MeSH search terms
//!   for the PubMed workflow
//!
//! ## Generate loop
//!
//! ```text
//! messages ──► model ──► reply is a tool call? ──no──► final answer
//!                ▲              │ yes
//!                │              ▼
//!                └──── tool result appended to the conversation
//! ```
//!
//! Tool calls are plain JSON replies of the form
//! `{"tool": "<id>", "arguments": {...}}`, optionally fence-wrapped.

pub mod mesh_terms;
pub mod research;
pub mod tools;

pub use mesh_terms::{mesh_term_agent, MESH_TERM_AGENT_NAME};
pub use research::{research_agent, RESEARCH_AGENT_NAME};
pub use tools::{Tool, VectorQueryTool};

use crate::llm::LLMAdapter;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};
use crate::utils::strip_json_fence;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_STEPS: usize = 5;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// One model turn within a generate call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStep {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub text: String,
    pub steps: Vec<AgentStep>,
}

pub struct Agent {
    name: String,
    instructions: String,
    llm: Arc<dyn LLMAdapter>,
    model: String,
    tools: Vec<Arc<dyn Tool>>,
    max_steps: usize,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        llm: Arc<dyn LLMAdapter>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            llm,
            model: model.into(),
            tools: Vec::new(),
            max_steps: DEFAULT_MAX_STEPS,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Upper bound on model calls per `generate`; at least one call is always made.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id()).collect()
    }

    /// Instructions plus the tool calling convention, when tools are bound.
    pub fn system_prompt(&self) -> String {
        if self.tools.is_empty() {
            return self.instructions.clone();
        }

        let mut prompt = format!("{}\n\nTOOLS:\n", self.instructions.trim_end());
        for tool in &self.tools {
            prompt.push_str(&format!(
                "- {}: {}\n  arguments: {}\n",
                tool.id(),
                tool.description(),
                tool.parameters()
            ));
        }
        prompt.push_str(
            "\nTo call a tool, reply with ONLY a JSON object of the form \
             {\"tool\": \"<tool id>\", \"arguments\": {...}} and nothing else. \
             The tool result will be sent back to you. \
             When you have enough information, reply with your final answer as plain text.",
        );
        prompt
    }

    /// Runs the model until it produces a reply that is not a tool call.
    pub async fn generate(&self, messages: Vec<LLMMessage>) -> AppResult<AgentResponse> {
        if messages.is_empty() {
            return Err(AppError::InvalidRequest("at least one message is required".to_string()));
        }

        info!(agent = %self.name, message_count = messages.len(), "Agent generate started");

        let system_prompt = self.system_prompt();
        let mut conversation = messages;
        let mut steps = Vec::new();

        for step_index in 0..self.max_steps {
            let request = LLMRequest {
                model: self.model.clone(),
                messages: conversation.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                system_instruction: Some(system_prompt.clone()),
            };

            let response = self.llm.create_chat_completion(&request).await?;
            let text = response.content;
            let is_last_step = step_index + 1 == self.max_steps;

            let call = match self.parse_tool_call(&text) {
                Some(call) if !is_last_step => call,
                Some(call) => {
                    warn!(agent = %self.name, tool = %call.tool, "Step limit reached with a pending tool call");
                    steps.push(AgentStep { text: text.clone(), tool_call: None, tool_result: None });
                    return Ok(AgentResponse { text, steps });
                }
                None => {
                    info!(agent = %self.name, steps = step_index + 1, response_len = text.len(), "Agent generate complete");
                    steps.push(AgentStep { text: text.clone(), tool_call: None, tool_result: None });
                    return Ok(AgentResponse { text, steps });
                }
            };

            let result = self.run_tool(&call).await;
            conversation.push(LLMMessage::assistant(text.clone()));
            conversation.push(LLMMessage::user(format!(
                "Tool result for {}:\n{}",
                call.tool, result
            )));
            steps.push(AgentStep {
                text,
                tool_call: Some(call),
                tool_result: Some(result),
            });
        }

        Err(AppError::Internal(format!("agent {} produced no reply", self.name)))
    }

    /// A reply is a tool call only if it is a JSON object naming a bound tool.
    fn parse_tool_call(&self, text: &str) -> Option<ToolCall> {
        if self.tools.is_empty() {
            return None;
        }
        let call: ToolCall = serde_json::from_str(strip_json_fence(text)).ok()?;
        self.tools.iter().any(|t| t.id() == call.tool).then_some(call)
    }

    /// Tool failures are reported back to the model rather than aborting the run.
    async fn run_tool(&self, call: &ToolCall) -> serde_json::Value {
        let Some(tool) = self.tools.iter().find(|t| t.id() == call.tool) else {
            return serde_json::json!({ "error": format!("unknown tool: {}", call.tool) });
        };

        debug!(agent = %self.name, tool = %call.tool, arguments = %call.arguments, "Executing tool");
        match tool.execute(call.arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(agent = %self.name, tool = %call.tool, error = %e, "Tool execution failed");
                serde_json::json!({ "error": e.to_string() })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::llm::LLMAdapter;
    use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every request it receives.
    pub struct ScriptedLLM {
        replies: Mutex<VecDeque<AppResult<String>>>,
        pub requests: Mutex<Vec<LLMRequest>>,
    }

    impl ScriptedLLM {
        pub fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                replies: Mutex::new(VecDeque::from([Err(AppError::LLMApi(message.to_string()))])),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMAdapter for ScriptedLLM {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::LLMApi("script exhausted".to_string())))?;
            Ok(LLMResponse {
                content: reply,
                finish_reason: "STOP".to_string(),
                usage: TokenUsage::default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ScriptedLLM;
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn id(&self) -> &str {
            "echoTool"
        }

        fn description(&self) -> &str {
            "Echoes its arguments"
        }

        fn parameters(&self) -> Value {
            json!({ "value": "string" })
        }

        async fn execute(&self, arguments: Value) -> AppResult<Value> {
            match arguments.get("value") {
                Some(v) => Ok(json!({ "echo": v })),
                None => Err(AppError::InvalidRequest("value is required".to_string())),
            }
        }
    }

    fn agent(llm: Arc<ScriptedLLM>) -> Agent {
        Agent::new("Test Agent", "Answer briefly.", llm, "test-model").with_tool(Arc::new(EchoTool))
    }

    #[tokio::test]
    async fn test_plain_reply_is_final_answer() {
        let llm = Arc::new(ScriptedLLM::new(vec!["Final answer."]));
        let response = agent(llm.clone()).generate(vec![LLMMessage::user("hi")]).await.unwrap();

        assert_eq!(response.text, "Final answer.");
        assert_eq!(response.steps.len(), 1);
        assert!(response.steps[0].tool_call.is_none());

        let requests = llm.requests.lock().unwrap();
        let system = requests[0].system_instruction.as_deref().unwrap();
        assert!(system.starts_with("Answer briefly."));
        assert!(system.contains("echoTool"));
    }

    #[tokio::test]
    async fn test_tool_call_result_is_fed_back() {
        let llm = Arc::new(ScriptedLLM::new(vec![
            "```json\n{\"tool\": \"echoTool\", \"arguments\": {\"value\": \"caffeine\"}}\n```",
            "Caffeine was found.",
        ]));
        let response = agent(llm.clone()).generate(vec![LLMMessage::user("hi")]).await.unwrap();

        assert_eq!(response.text, "Caffeine was found.");
        assert_eq!(response.steps.len(), 2);
        assert_eq!(response.steps[0].tool_result, Some(json!({ "echo": "caffeine" })));

        let requests = llm.requests.lock().unwrap();
        let second = &requests[1].messages;
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, "assistant");
        assert!(second[2].content.contains("\"echo\":\"caffeine\""));
    }

    #[tokio::test]
    async fn test_tool_error_is_reported_to_model() {
        let llm = Arc::new(ScriptedLLM::new(vec![
            r#"{"tool": "echoTool", "arguments": {}}"#,
            "I could not find sufficient information.",
        ]));
        let response = agent(llm).generate(vec![LLMMessage::user("hi")]).await.unwrap();

        let result = response.steps[0].tool_result.as_ref().unwrap();
        assert!(result["error"].as_str().unwrap().contains("value is required"));
        assert_eq!(response.text, "I could not find sufficient information.");
    }

    #[tokio::test]
    async fn test_unknown_tool_json_is_treated_as_answer() {
        let llm = Arc::new(ScriptedLLM::new(vec![r#"{"tool": "webSearch", "arguments": {}}"#]));
        let response = agent(llm).generate(vec![LLMMessage::user("hi")]).await.unwrap();

        assert_eq!(response.steps.len(), 1);
        assert!(response.text.contains("webSearch"));
    }

    #[tokio::test]
    async fn test_step_limit_returns_last_reply() {
        let call = r#"{"tool": "echoTool", "arguments": {"value": 1}}"#;
        let llm = Arc::new(ScriptedLLM::new(vec![call, call]));
        let response = agent(llm.clone())
            .with_max_steps(2)
            .generate(vec![LLMMessage::user("hi")])
            .await
            .unwrap();

        assert_eq!(response.steps.len(), 2);
        assert_eq!(response.text, call);
        assert_eq!(llm.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_conversation_is_rejected() {
        let llm = Arc::new(ScriptedLLM::new(vec![]));
        let err = agent(llm).generate(vec![]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let llm = Arc::new(ScriptedLLM::failing("quota exceeded"));
        let err = agent(llm).generate(vec![LLMMessage::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }
}
