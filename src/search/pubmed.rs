//! PubMed Central Client
//!
//! Wraps three NCBI endpoints:
//!
//! 1. **ESearch** (`esearch.fcgi?db=pmc`): MeSH term query → PMC ids
//! 2. **ESummary** (`esummary.fcgi?db=pmc`): PMC ids → article metadata
//! 3. **BioC** (`pmcoa.cgi/BioC_xml/PMC<id>/unicode`): full-text XML
//!
//! ## Failure policy
//!
//! A non-success status from ESearch or ESummary is logged and yields no results.
//! Result containers that are missing or have an unexpected shape are treated as
//! empty. Transport failures and bodies that are not JSON at all are returned as
//! errors to the caller.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::PubMedConfig;
use crate::types::AppError;

pub const UNKNOWN: &str = "Unknown";
pub const NO_TITLE: &str = "No title available";

static PMC_ARTICLE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"articles/(?:PMC)?(\d+)").expect("valid PMC article pattern"));

/// Errors that can occur while talking to NCBI
#[derive(Debug, Error)]
pub enum PubMedError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),

    #[error("No PMC id in article URL: {0}")]
    InvalidArticleUrl(String),
}

impl From<PubMedError> for AppError {
    fn from(err: PubMedError) -> Self {
        match err {
            PubMedError::ParseError(msg) => AppError::Parse(msg),
            other => AppError::Http(other.to_string()),
        }
    }
}

pub type PubMedResult<T> = Result<T, PubMedError>;

/// Normalized article metadata. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub pmid: String,
    pub pmcid: String,
    pub title: String,
    pub authors: Vec<String>,
    pub journal: String,
    pub pub_date: String,
    pub full_text_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullArticleResult {
    pub pmc_id: String,
    pub url: String,
    pub xml_content: String,
    pub success: bool,
}

// ESearch response schema
#[derive(Debug, Default, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: Option<ESearchResult>,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

// ESummary record schema (one entry of `result`, keyed by uid).
// Each field decodes on its own: a value of the wrong type reads as missing
// and picks up the usual default instead of rejecting the whole record.
#[derive(Debug, Default, Deserialize)]
struct SummaryRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    authors: Option<Vec<SummaryAuthor>>,
    #[serde(default, deserialize_with = "lenient_string")]
    fulljournalname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pubdate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    epubdate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    printpubdate: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    articleids: Option<Vec<SummaryArticleId>>,
}

#[derive(Debug, Deserialize)]
struct SummaryAuthor {
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryArticleId {
    #[serde(default, deserialize_with = "lenient_string")]
    idtype: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    value: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Keeps the elements that decode and drops the rest; a non-array reads as missing.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Treats empty strings like missing values.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl SummaryRecord {
    fn into_article(self, article_base_url: &str) -> Option<ArticleSummary> {
        let pmcid = non_empty(&self.uid)?.to_string();

        let pmid = self
            .articleids
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|id| id.idtype.as_deref() == Some("pmid"))
            .and_then(|id| non_empty(&id.value))
            .unwrap_or(UNKNOWN)
            .to_string();

        let mut authors: Vec<String> = self
            .authors
            .unwrap_or_default()
            .iter()
            .filter_map(|a| non_empty(&a.name))
            .map(String::from)
            .collect();
        if authors.is_empty() {
            authors.push(UNKNOWN.to_string());
        }

        let journal = non_empty(&self.fulljournalname)
            .or_else(|| non_empty(&self.source))
            .unwrap_or(UNKNOWN)
            .to_string();

        let pub_date = non_empty(&self.pubdate)
            .or_else(|| non_empty(&self.epubdate))
            .or_else(|| non_empty(&self.printpubdate))
            .unwrap_or(UNKNOWN)
            .to_string();

        Some(ArticleSummary {
            pmid,
            title: non_empty(&self.title).unwrap_or(NO_TITLE).to_string(),
            full_text_url: format!("{}/{}/", article_base_url.trim_end_matches('/'), pmcid),
            pmcid,
            authors,
            journal,
            pub_date,
        })
    }
}

/// Boolean AND of MeSH-qualified terms, e.g. `Caffeine[mesh] AND Sleep[mesh]`.
pub fn build_term_query(key_terms: &[String]) -> String {
    key_terms
        .iter()
        .map(|term| format!("{}[mesh]", term))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `PMC<digits>` from an article URL such as `.../pmc/articles/1234567/`.
pub fn pmc_id_from_url(url: &str) -> PubMedResult<String> {
    PMC_ARTICLE_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|digits| format!("PMC{}", digits.as_str()))
        .ok_or_else(|| PubMedError::InvalidArticleUrl(url.to_string()))
}

pub struct PubMedClient {
    client: Client,
    eutils_base_url: String,
    bioc_base_url: String,
    article_base_url: String,
    retmax: u32,
}

impl PubMedClient {
    pub fn new(config: &PubMedConfig) -> Self {
        Self {
            client: Client::new(),
            eutils_base_url: config.eutils_base_url.trim_end_matches('/').to_string(),
            bioc_base_url: config.bioc_base_url.trim_end_matches('/').to_string(),
            article_base_url: config.article_base_url.clone(),
            retmax: config.retmax,
        }
    }

    /// Searches PMC and summarizes the hits. No request is made for an empty term list.
    pub async fn search_articles(&self, key_terms: &[String]) -> PubMedResult<Vec<ArticleSummary>> {
        if key_terms.is_empty() {
            debug!("No key terms, skipping PubMed search");
            return Ok(Vec::new());
        }

        let query = build_term_query(key_terms);
        let ids = self.search_ids(&query).await?;
        if ids.is_empty() {
            info!(query = %query, "No PMCIDs found for query");
            return Ok(Vec::new());
        }

        self.fetch_summaries(&ids).await
    }

    /// ESearch: PMC ids matching `term`, at most `retmax`.
    pub async fn search_ids(&self, term: &str) -> PubMedResult<Vec<String>> {
        let url = format!("{}/esearch.fcgi", self.eutils_base_url);
        let retmax = self.retmax.to_string();

        info!(term = %term, "Searching PubMed Central");

        let Some(body) = self
            .get_json(
                "ESearch",
                &url,
                &[("db", "pmc"), ("term", term), ("retmax", retmax.as_str()), ("retmode", "json")],
            )
            .await?
        else {
            return Ok(Vec::new());
        };

        let parsed: ESearchResponse = serde_json::from_value(body).unwrap_or_else(|e| {
            warn!(error = %e, "Unexpected ESearch result shape, treating as empty");
            ESearchResponse::default()
        });

        let ids = parsed.esearchresult.map(|r| r.idlist).unwrap_or_default();
        debug!(count = ids.len(), "ESearch returned ids");
        Ok(ids)
    }

    /// ESummary: metadata for `ids`, in the order the ids were given (ESearch
    /// relevance order) rather than the numeric uid order of the `result` object.
    pub async fn fetch_summaries(&self, ids: &[String]) -> PubMedResult<Vec<ArticleSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/esummary.fcgi", self.eutils_base_url);
        let id_list = ids.join(",");

        let Some(body) = self
            .get_json("ESummary", &url, &[("db", "pmc"), ("id", id_list.as_str()), ("retmode", "json")])
            .await?
        else {
            return Ok(Vec::new());
        };

        let Some(result) = body.get("result").and_then(Value::as_object) else {
            warn!("ESummary response has no result object, treating as empty");
            return Ok(Vec::new());
        };

        let articles: Vec<ArticleSummary> = ids
            .iter()
            .filter_map(|id| result.get(id))
            .filter_map(|entry| match serde_json::from_value::<SummaryRecord>(entry.clone()) {
                Ok(record) => record.into_article(&self.article_base_url),
                Err(e) => {
                    warn!(error = %e, "Skipping ESummary entry that is not an object");
                    None
                }
            })
            .collect();

        info!(count = articles.len(), "ESummary returned articles");
        Ok(articles)
    }

    /// Full-text BioC XML for one article.
    pub async fn fetch_full_text(&self, article: &ArticleSummary) -> PubMedResult<FullArticleResult> {
        let pmc_id = pmc_id_from_url(&article.full_text_url)?;
        let api_url = format!("{}/{}/unicode", self.bioc_base_url, pmc_id);

        let response = self
            .client
            .get(&api_url)
            .send()
            .await
            .map_err(|e| PubMedError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PubMedError::HttpStatus(response.status().as_u16()));
        }

        let xml_content = response
            .text()
            .await
            .map_err(|e| PubMedError::RequestFailed(e.to_string()))?;

        Ok(FullArticleResult {
            pmc_id,
            url: api_url,
            xml_content,
            success: true,
        })
    }

    /// `None` when the endpoint answered with a non-success status.
    async fn get_json(
        &self,
        endpoint: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> PubMedResult<Option<Value>> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| PubMedError::RequestFailed(format!("{}: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            error!(
                endpoint,
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or(""),
                "{} failed",
                endpoint
            );
            return Ok(None);
        }

        response
            .json::<Value>()
            .await
            .map(Some)
            .map_err(|e| PubMedError::ParseError(format!("{}: {}", endpoint, e)))
    }
}
