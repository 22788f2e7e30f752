//! PubMed Research Workflow
//!
//! Four steps run strictly in order, each reading the typed results of the steps
//! before it from a shared [`WorkflowContext`]:
//!
//! ```text
//! { query }
//!    │
//!    ▼
//! generateMeshTerms ──► fetchArticles ──► fetchFullArticles ──► structureResponse
//!  (MeSH agent)        (ESearch+ESummary)  (BioC XML, per item)   (WorkflowResult)
//! ```
//!
//! A step that returns an error is recorded as [`StepResult::Failed`]; later steps
//! check the status of their inputs and degrade to empty data. The caller always
//! receives a [`WorkflowResult`].
//!
//! `structureResponse` reads the article list from `fetchArticles`; the full-text
//! results stay in the context and are not part of the public result.

pub mod steps;
pub mod types;

pub use types::*;

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::agents::Agent;
use crate::search::PubMedClient;
use crate::types::AppResult;

pub const WORKFLOW_NAME: &str = "pubmed-research-workflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepId {
    #[serde(rename = "generateMeshTerms")]
    GenerateMeshTerms,
    #[serde(rename = "fetchArticles")]
    FetchArticles,
    #[serde(rename = "fetchFullArticles")]
    FetchFullArticles,
    #[serde(rename = "structureResponse")]
    StructureResponse,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::GenerateMeshTerms => "generateMeshTerms",
            StepId::FetchArticles => "fetchArticles",
            StepId::FetchFullArticles => "fetchFullArticles",
            StepId::StructureResponse => "structureResponse",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failed,
}

/// Outcome of one step, consumed uniformly by the steps after it.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult<T> {
    Success(T),
    Failed { error: String },
}

impl<T> StepResult<T> {
    pub fn status(&self) -> StepStatus {
        match self {
            StepResult::Success(_) => StepStatus::Success,
            StepResult::Failed { .. } => StepStatus::Failed,
        }
    }

    pub fn output(&self) -> Option<&T> {
        match self {
            StepResult::Success(output) => Some(output),
            StepResult::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step_id: StepId,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-run state. Step results are written once and never removed.
#[derive(Debug)]
pub struct WorkflowContext {
    trigger: TriggerData,
    mesh_terms: Option<StepResult<MeshTermsOutput>>,
    articles: Option<StepResult<ArticlesOutput>>,
    full_articles: Option<StepResult<FullArticlesOutput>>,
    result: Option<WorkflowResult>,
    records: Vec<StepRecord>,
}

impl WorkflowContext {
    pub fn new(trigger: TriggerData) -> Self {
        Self {
            trigger,
            mesh_terms: None,
            articles: None,
            full_articles: None,
            result: None,
            records: Vec::new(),
        }
    }

    pub fn trigger(&self) -> &TriggerData {
        &self.trigger
    }

    /// `generateMeshTerms` output, if that step succeeded.
    pub fn mesh_terms(&self) -> Option<&MeshTermsOutput> {
        self.mesh_terms.as_ref().and_then(StepResult::output)
    }

    /// `fetchArticles` output, if that step succeeded.
    pub fn articles(&self) -> Option<&ArticlesOutput> {
        self.articles.as_ref().and_then(StepResult::output)
    }

    /// `fetchFullArticles` output, if that step succeeded.
    pub fn full_articles(&self) -> Option<&FullArticlesOutput> {
        self.full_articles.as_ref().and_then(StepResult::output)
    }

    pub fn result(&self) -> Option<&WorkflowResult> {
        self.result.as_ref()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn status(&self, step_id: StepId) -> Option<StepStatus> {
        self.records.iter().find(|r| r.step_id == step_id).map(|r| r.status)
    }

    /// Converts a step outcome into a [`StepResult`] and appends its record.
    fn settle<T>(&mut self, step_id: StepId, outcome: AppResult<T>) -> StepResult<T> {
        let result = match outcome {
            Ok(output) => {
                info!(step = %step_id, "Step succeeded");
                StepResult::Success(output)
            }
            Err(e) => {
                error!(step = %step_id, error = %e, "Step failed");
                StepResult::Failed { error: e.to_string() }
            }
        };

        self.records.push(StepRecord {
            step_id,
            status: result.status(),
            error: match &result {
                StepResult::Failed { error } => Some(error.clone()),
                StepResult::Success(_) => None,
            },
        });
        result
    }
}

/// What a caller receives for one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub run_id: Uuid,
    pub workflow: &'static str,
    pub result: WorkflowResult,
    pub steps: Vec<StepRecord>,
}

pub struct ResearchWorkflow {
    term_agent: Arc<Agent>,
    pubmed: Arc<PubMedClient>,
}

impl ResearchWorkflow {
    pub fn new(term_agent: Arc<Agent>, pubmed: Arc<PubMedClient>) -> Self {
        Self { term_agent, pubmed }
    }

    /// Runs every step and returns the public result with the step statuses.
    pub async fn run(&self, trigger: TriggerData) -> WorkflowRun {
        let run_id = Uuid::new_v4();
        let span = info_span!("workflow_run", %run_id, workflow = WORKFLOW_NAME);

        async move {
            let mut ctx = self.execute(trigger).await;
            let result = ctx
                .result
                .take()
                .unwrap_or_else(|| steps::structure_response(&ctx));

            WorkflowRun {
                run_id,
                workflow: WORKFLOW_NAME,
                result,
                steps: ctx.records,
            }
        }
        .instrument(span)
        .await
    }

    /// Runs every step and returns the full context, including full-text results.
    pub async fn execute(&self, trigger: TriggerData) -> WorkflowContext {
        info!(query = %trigger.query, "Starting research workflow");
        let mut ctx = WorkflowContext::new(trigger);

        let outcome = steps::generate_mesh_terms(&ctx, &self.term_agent).await;
        let mesh_terms = ctx.settle(StepId::GenerateMeshTerms, outcome);
        ctx.mesh_terms = Some(mesh_terms);

        let outcome = steps::fetch_articles(&ctx, &self.pubmed).await;
        let articles = ctx.settle(StepId::FetchArticles, outcome);
        ctx.articles = Some(articles);

        let outcome = steps::fetch_full_articles(&ctx, &self.pubmed).await;
        let full_articles = ctx.settle(StepId::FetchFullArticles, outcome);
        ctx.full_articles = Some(full_articles);

        let result = steps::structure_response(&ctx);
        ctx.settle(StepId::StructureResponse, Ok(()));
        ctx.result = Some(result);

        info!(
            articles = ctx.result().map(|r| r.articles.len()).unwrap_or_default(),
            full_texts = ctx.full_articles().map(|f| f.results.len()).unwrap_or_default(),
            "Research workflow complete"
        );
        ctx
    }
}
