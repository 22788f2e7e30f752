use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::models::AppState;
use crate::workflow::{TriggerData, WorkflowRun};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/workflows/pubmed-research/run", post(run_pubmed_research))
        .with_state(state)
}

/// Always 200: step failures are reported in the run's step records.
async fn run_pubmed_research(
    State(state): State<AppState>,
    Json(trigger): Json<TriggerData>,
) -> Json<WorkflowRun> {
    info!(query = %trigger.query, "Received workflow run request");
    Json(state.workflow.run(trigger).await)
}
