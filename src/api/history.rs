//! Read-only view of the shared conversation

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;
use crate::history::ChatMessage;

/// History response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub max_messages: usize,
    pub messages: Vec<ChatMessage>,
}

/// Current conversation snapshot
async fn history(State(state): State<Arc<ApiState>>) -> Json<HistoryResponse> {
    let history = state.pipeline.history();
    Json(HistoryResponse {
        max_messages: history.max_messages(),
        messages: history.snapshot().await,
    })
}

/// Build history router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/history", get(history))
        .with_state(state)
}
