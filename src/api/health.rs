//! Health and status endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::{ApiState, ModelInfo};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// System status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub models: ModelInfo,
    pub history: HistoryStatus,
}

/// Conversation fill level
#[derive(Serialize)]
pub struct HistoryStatus {
    pub len: usize,
    pub max_messages: usize,
}

/// Get system status
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let history = state.pipeline.history();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        models: state.models.clone(),
        history: HistoryStatus {
            len: history.len().await,
            max_messages: history.max_messages(),
        },
    })
}

/// Build status router (needs state)
pub fn status_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .with_state(state)
}
