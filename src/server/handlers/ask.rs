use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::graph::PipelineState;
use crate::pipeline::{PipelineOutcome, Strategy, TraceStep};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub thoughts: Vec<String>,
    pub steps: Vec<TraceStep>,
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PipelineState>,
}

impl From<PipelineOutcome> for AskResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        Self {
            thoughts: outcome.thoughts(),
            answer: outcome.answer,
            steps: outcome.steps,
            strategy: outcome.strategy,
            state: outcome.state,
        }
    }
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.question.trim().is_empty() {
        return Err(ApiError::BadRequest("Question must not be empty".to_string()));
    }
    let strategy = payload
        .strategy
        .unwrap_or(state.settings.server.default_strategy);

    let outcome = state
        .pipeline
        .run(&payload.question, strategy, payload.session_id.as_deref(), None)
        .await?;

    Ok(Json(AskResponse::from(outcome)))
}
