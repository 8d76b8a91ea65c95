use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // A failing index does not fail the health check.
    let indexed_documents = match state.index.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("Health check could not count indexed documents: {}", e);
            None
        }
    };

    Json(json!({
        "status": "ok",
        "started_at": state.started_at.to_rfc3339(),
        "llm_provider": state.llm.provider_name(),
        "default_strategy": state.settings.server.default_strategy,
        "indexed_documents": indexed_documents,
    }))
}
