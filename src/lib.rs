// PubMed Research - research assistant agent and PubMed Central literature workflow

pub mod config;
pub mod db;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // PubMed E-utilities and BioC full text
pub mod embeddings;
pub mod routes;
pub mod utils;
pub mod workflow;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
