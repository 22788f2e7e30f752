//! Vector search over the paper index.
//!
//! Two backends implement [`VectorStore`]:
//! - [`PgVectorStore`]: a pgvector table (one table per index) queried by cosine distance
//! - [`InMemoryVectorStore`]: brute-force cosine similarity, used when no database is configured

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::{AppError, AppResult};

static INDEX_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid index name pattern"));

/// One nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f64,
    pub metadata: serde_json::Value,
}

/// A stored chunk: embedding plus the metadata returned to callers.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns up to `top_k` matches ordered by descending similarity.
    async fn query(&self, index_name: &str, embedding: &[f32], top_k: usize) -> AppResult<Vec<VectorMatch>>;
}

/// Index names are interpolated into SQL, so only plain identifiers are accepted.
pub fn validate_index_name(index_name: &str) -> AppResult<()> {
    if INDEX_NAME.is_match(index_name) {
        Ok(())
    } else {
        Err(AppError::VectorStore(format!("invalid index name: {:?}", index_name)))
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// pgvector text literal, e.g. `[0.1,0.2]`.
fn to_vector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn query(&self, index_name: &str, embedding: &[f32], top_k: usize) -> AppResult<Vec<VectorMatch>> {
        validate_index_name(index_name)?;

        let sql = format!(
            r#"
            SELECT vector_id, metadata, 1 - (embedding <=> $1::vector) AS score
            FROM {index_name}
            ORDER BY embedding <=> $1::vector
            LIMIT $2
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(to_vector_literal(embedding))
            .bind(top_k as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in rows {
            matches.push(VectorMatch {
                id: row.try_get("vector_id")?,
                score: row.try_get("score")?,
                metadata: row
                    .try_get::<Option<serde_json::Value>, _>("metadata")?
                    .unwrap_or(serde_json::Value::Null),
            });
        }

        debug!(index = %index_name, count = matches.len(), "pgvector query complete");
        Ok(matches)
    }
}

#[derive(Default)]
pub struct InMemoryVectorStore {
    indexes: RwLock<HashMap<String, Vec<VectorRecord>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the index if needed; records with an existing id are replaced.
    pub async fn upsert(&self, index_name: &str, records: Vec<VectorRecord>) -> AppResult<()> {
        validate_index_name(index_name)?;

        let mut indexes = self.indexes.write().await;
        let index = indexes.entry(index_name.to_string()).or_default();
        for record in records {
            match index.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => index.push(record),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn query(&self, index_name: &str, embedding: &[f32], top_k: usize) -> AppResult<Vec<VectorMatch>> {
        let indexes = self.indexes.read().await;
        let records = indexes
            .get(index_name)
            .ok_or_else(|| AppError::VectorStore(format!("index {} does not exist", index_name)))?;

        let mut matches: Vec<VectorMatch> = records
            .iter()
            .map(|record| VectorMatch {
                id: record.id.clone(),
                score: cosine_similarity(embedding, &record.embedding),
                metadata: record.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }
}
