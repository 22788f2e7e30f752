use sqlx::postgres::{PgPool, PgPoolOptions};
use crate::config::VectorConfig;
use crate::types::{AppError, AppResult};

/// Connects to the pgvector database. `None` when no `DATABASE_URL` is configured.
pub async fn create_pool(config: &VectorConfig) -> AppResult<Option<PgPool>> {
    let Some(url) = config.database_url.as_deref() else {
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .map_err(|e| AppError::VectorStore(format!("failed to connect to vector database: {}", e)))?;

    health_check(&pool).await?;

    Ok(Some(pool))
}

pub async fn health_check(pool: &PgPool) -> AppResult<bool> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_database_url_yields_no_pool() {
        let config = VectorConfig {
            database_url: None,
            index_name: "papers".to_string(),
            top_k: 10,
            max_connections: 1,
        };
        assert!(create_pool(&config).await.unwrap().is_none());
    }
}
