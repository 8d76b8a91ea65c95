use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pipeline::Strategy;

/// Typed view over the merged configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub agent: AgentConfig,
    pub graph: GraphConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub api_key_env: String,
    pub temperature: f64,
    /// Sampling temperature for the structured validator's second attempt.
    pub retry_temperature: f64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub document_type: String,
    #[serde(default)]
    pub index_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub memory_turns: usize,
    /// Conversation sessions kept before the least recently used is dropped.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_sessions() -> usize {
    crate::agent::DEFAULT_MAX_SESSIONS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub max_steps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub default_strategy: Strategy,
    /// Browser origins allowed by CORS. Empty means local development origins.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}
