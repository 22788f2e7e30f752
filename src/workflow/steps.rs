// Workflow steps

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use super::types::*;
use super::WorkflowContext;
use crate::agents::Agent;
use crate::search::PubMedClient;
use crate::types::{AppError, AppResult, LLMMessage};
use crate::utils::{preview, strip_json_fence};

const CONTENT_PREVIEW_CHARS: usize = 200;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeshTermsReply {
    parsed_query: ParsedQuery,
    #[serde(default)]
    note: Option<String>,
}

/// Parses the term-extraction reply. Anything other than a complete
/// `{ parsedQuery: { rawTerms, keyTerms }, note? }` object is an error.
pub fn parse_mesh_terms(text: &str) -> AppResult<MeshTermsOutput> {
    let reply: MeshTermsReply = serde_json::from_str(strip_json_fence(text))
        .map_err(|e| AppError::Parse(format!("term extraction reply is not valid JSON: {}", e)))?;

    Ok(MeshTermsOutput {
        parsed_query: reply.parsed_query,
        note: reply.note.filter(|n| !n.is_empty()),
    })
}

/// Step 1: asks the MeSH term agent to turn the query into search terms.
pub async fn generate_mesh_terms(ctx: &WorkflowContext, agent: &Agent) -> AppResult<MeshTermsOutput> {
    let response = agent
        .generate(vec![LLMMessage::user(ctx.trigger().query.clone())])
        .await?;

    let first = response
        .steps
        .first()
        .ok_or_else(|| AppError::LLMApi("term extraction agent returned no steps".to_string()))?;

    let output = parse_mesh_terms(&first.text)?;
    info!(
        key_terms = ?output.parsed_query.key_terms,
        has_note = output.note.is_some(),
        "Generated MeSH terms"
    );
    Ok(output)
}

/// Step 2: searches PMC with the extracted key terms.
pub async fn fetch_articles(ctx: &WorkflowContext, pubmed: &PubMedClient) -> AppResult<ArticlesOutput> {
    let Some(mesh_terms) = ctx.mesh_terms() else {
        warn!("generateMeshTerms did not succeed, skipping article search");
        return Ok(ArticlesOutput::default());
    };

    let articles = pubmed
        .search_articles(&mesh_terms.parsed_query.key_terms)
        .await?;

    Ok(ArticlesOutput { articles })
}

/// Step 3: fetches BioC full text for each article, one at a time.
/// An article whose fetch fails is logged and left out.
pub async fn fetch_full_articles(
    ctx: &WorkflowContext,
    pubmed: &PubMedClient,
) -> AppResult<FullArticlesOutput> {
    let Some(articles) = ctx.articles() else {
        warn!("fetchArticles did not succeed, skipping full-text fetch");
        return Ok(FullArticlesOutput::default());
    };

    let mut results = Vec::with_capacity(articles.articles.len());
    for article in &articles.articles {
        info!(url = %article.full_text_url, "Fetching full text");

        match pubmed.fetch_full_text(article).await {
            Ok(result) => {
                info!(pmc_id = %result.pmc_id, "Successfully fetched full text");
                debug!(
                    pmc_id = %result.pmc_id,
                    "Content preview: {}...",
                    preview(&result.xml_content, CONTENT_PREVIEW_CHARS)
                );
                results.push(result);
            }
            Err(e) => {
                error!(url = %article.full_text_url, error = %e, "Error fetching full text");
            }
        }
    }

    Ok(FullArticlesOutput { results })
}

/// Step 4: assembles the public result from whatever earlier steps produced.
pub fn structure_response(ctx: &WorkflowContext) -> WorkflowResult {
    let mesh_terms = ctx.mesh_terms();
    let parsed_query = mesh_terms
        .map(|m| m.parsed_query.clone())
        .unwrap_or_default();
    let note = mesh_terms.and_then(|m| m.note.clone());

    match ctx.articles() {
        Some(output) => WorkflowResult {
            parsed_query,
            articles: output.articles.clone(),
            timestamp: timestamp(),
            note,
        },
        None => WorkflowResult {
            parsed_query,
            articles: Vec::new(),
            timestamp: timestamp(),
            note: Some(note.unwrap_or_else(|| STEP_FAILED_NOTE.to_string())),
        },
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
