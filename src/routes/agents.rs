use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::agents::AgentResponse;
use crate::models::{AppState, GenerateRequest};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/agents/research/generate", post(generate))
        .with_state(state)
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<AgentResponse>> {
    if request.messages.is_empty() {
        return Err(AppError::InvalidRequest("messages must not be empty".to_string()));
    }

    info!(agent = %state.agent.name(), messages = request.messages.len(), "Received generate request");
    let response = state.agent.generate(request.messages).await?;
    info!(steps = response.steps.len(), "Generate request complete");

    Ok(Json(response))
}
