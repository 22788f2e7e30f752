// Workflow data model

use serde::{Deserialize, Serialize};

use crate::search::{ArticleSummary, FullArticleResult};

/// Marker note returned when the article search step did not succeed.
pub const STEP_FAILED_NOTE: &str = "Step failed";

/// Input that starts a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerData {
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    pub raw_terms: Vec<String>,
    pub key_terms: Vec<String>,
}

/// Output of `generateMeshTerms`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshTermsOutput {
    pub parsed_query: ParsedQuery,
    pub note: Option<String>,
}

/// Output of `fetchArticles`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticlesOutput {
    pub articles: Vec<ArticleSummary>,
}

/// Output of `fetchFullArticles`. Failed fetches are absent, not placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FullArticlesOutput {
    pub results: Vec<FullArticleResult>,
}

/// Public result of a run. `note` serializes as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub parsed_query: ParsedQuery,
    pub articles: Vec<ArticleSummary>,
    pub timestamp: String,
    pub note: Option<String>,
}
