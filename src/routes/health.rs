use axum::{extract::State, routing::get, Json, Router};
use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let vector_store = match &state.pool {
        Some(pool) => match crate::db::health_check(pool).await {
            Ok(_) => "connected",
            Err(_) => "unavailable",
        },
        None => "in-memory",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        vector_store: vector_store.to_string(),
    })
}
