//! In-process fakes for the LLM and index oracles.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, LlmProvider, LlmService};
use crate::rag::{Document, VectorIndex};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub temperature: Option<f64>,
    pub stop: Option<Vec<String>>,
}

struct ScriptState {
    replies: VecDeque<Result<String, ApiError>>,
    calls: Vec<RecordedCall>,
}

/// Replays canned replies in order and records every request.
#[derive(Clone)]
pub struct ScriptedLlm {
    state: Arc<Mutex<ScriptState>>,
    embedding: Vec<f32>,
}

impl ScriptedLlm {
    pub fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                replies: replies.into_iter().map(|r| Ok(r.into())).collect(),
                calls: Vec::new(),
            })),
            embedding: vec![1.0, 0.0],
        }
    }

    pub fn failing() -> Self {
        let llm = Self::new(Vec::<String>::new());
        llm.push_error(ApiError::Upstream("connection refused".to_string()));
        llm
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn push_error(&self, err: ApiError) {
        self.state.lock().unwrap().replies.push_back(Err(err));
    }

    pub fn service(&self) -> LlmService {
        LlmService::with_models(Arc::new(self.clone()), "scripted-chat", "scripted-embed")
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            prompt: request
                .messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            temperature: request.temperature,
            stop: request.stop.clone(),
        });
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Upstream("script exhausted".to_string())))
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|_| self.embedding.clone()).collect())
    }
}

/// Index that returns a fixed ranked list regardless of query.
pub struct StaticIndex {
    documents: Vec<Document>,
    unavailable: bool,
}

impl StaticIndex {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            documents: Vec::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<Document>, ApiError> {
        if self.unavailable {
            return Err(ApiError::Upstream("index unavailable".to_string()));
        }
        Ok(self.documents.iter().take(k).cloned().collect())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.documents.len())
    }
}

pub fn typed_doc(content: &str, doc_type: &str, page: u64) -> Document {
    let mut metadata = crate::rag::Metadata::new();
    metadata.insert("type".to_string(), serde_json::json!(doc_type));
    metadata.insert("page".to_string(), serde_json::json!(page));
    Document::new(content, metadata)
}
