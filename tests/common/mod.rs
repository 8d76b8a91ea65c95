#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::net::TcpListener;

use research_assistant::core::config::defaults::default_config;
use research_assistant::core::config::service::parse_app_config;
use research_assistant::core::config::{AppConfig, AppPaths, ConfigService};
use research_assistant::core::errors::ApiError;
use research_assistant::llm::{ChatRequest, LlmProvider, LlmService};
use research_assistant::rag::{Document, Metadata, VectorIndex};
use research_assistant::server::router::router;
use research_assistant::state::AppState;

/// Replays chat replies in order; embeds text by counting a few keywords.
#[derive(Clone, Default)]
pub struct FakeLlm {
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeLlm {
    pub fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            prompts: Arc::default(),
        }
    }

    pub fn service(&self) -> LlmService {
        LlmService::with_models(Arc::new(self.clone()), "fake-chat", "fake-embed")
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

pub const KEYWORDS: [&str; 3] = ["inflation", "rates", "housing"];

pub fn keyword_embedding(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut vector: Vec<f32> = KEYWORDS
        .iter()
        .map(|k| lower.matches(k).count() as f32)
        .collect();
    vector.push(0.1);
    vector
}

#[async_trait]
impl LlmProvider for FakeLlm {
    fn name(&self) -> &str {
        "fake"
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Upstream("no scripted reply left".to_string()))
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|text| keyword_embedding(text)).collect())
    }
}

/// Index returning a fixed ranked list.
pub struct FixedIndex(pub Vec<Document>);

#[async_trait]
impl VectorIndex for FixedIndex {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<Document>, ApiError> {
        Ok(self.0.iter().take(k).cloned().collect())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.0.len())
    }
}

pub fn doc(content: &str, doc_type: &str, page: u64) -> Document {
    let mut metadata = Metadata::new();
    metadata.insert("type".to_string(), json!(doc_type));
    metadata.insert("page".to_string(), json!(page));
    Document::new(content, metadata)
}

pub fn default_settings() -> AppConfig {
    parse_app_config(default_config()).expect("defaults parse")
}

/// Serves the full router on an ephemeral local port over a one-document index.
pub async fn spawn_app(llm: &FakeLlm, dir: &tempfile::TempDir) -> SocketAddr {
    let paths = Arc::new(AppPaths::with_data_dir(
        dir.path().to_path_buf(),
        dir.path().join("data"),
    ));
    let state = AppState::assemble(
        ConfigService::new(paths),
        default_settings(),
        llm.service(),
        Arc::new(FixedIndex(vec![doc("Rates held steady.", "NarrativeText", 1)])),
    )
    .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}
