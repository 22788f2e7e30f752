//! MeSH Term Agent
//!
//! Converts a free-text research question into Medical Subject Headings for the
//! PubMed Central workflow. The reply is a JSON object (optionally fence-wrapped):
//!
//! ```json
//! { "parsedQuery": { "rawTerms": ["caffeine", "sleep"], "keyTerms": ["Caffeine", "Sleep"] },
//!   "note": null }
//! ```

use super::Agent;
use crate::llm::LLMAdapter;
use std::sync::Arc;

pub const MESH_TERM_AGENT_NAME: &str = "PubMed Research Agent";

pub const MESH_TERM_AGENT_INSTRUCTIONS: &str = r#"You are a biomedical literature search specialist.
Convert the user's research question into Medical Subject Headings (MeSH) for a PubMed Central search.

OUTPUT FORMAT (respond with ONLY valid JSON):
{
  "parsedQuery": {
    "rawTerms": ["significant words or phrases exactly as the user wrote them"],
    "keyTerms": ["official MeSH descriptors, one concept each"]
  },
  "note": "short remark about ambiguity or terms without a MeSH descriptor, or null"
}

RULES:
- Use official MeSH descriptor spelling and capitalization (e.g. "Caffeine", "Sleep Wake Disorders")
- Only include key terms that are essential to the question; prefer 1 to 4
- Use an empty keyTerms array if the question is not biomedical
- Do not add commentary outside the JSON object"#;

pub fn mesh_term_agent(llm: Arc<dyn LLMAdapter>, model: &str) -> Agent {
    Agent::new(MESH_TERM_AGENT_NAME, MESH_TERM_AGENT_INSTRUCTIONS, llm, model)
        .with_max_steps(1)
        .with_max_tokens(1024)
        .with_temperature(0.0)
}
