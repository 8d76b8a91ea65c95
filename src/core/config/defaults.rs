use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_TOP_K: usize = 20;
pub const DEFAULT_DOCUMENT_TYPE: &str = "NarrativeText";

/// Built-in configuration. `config.yml` is deep-merged on top of this.
pub fn default_config() -> Value {
    json!({
        "llm": {
            "base_url": DEFAULT_BASE_URL,
            "model": DEFAULT_CHAT_MODEL,
            "embedding_model": DEFAULT_EMBEDDING_MODEL,
            "api_key_env": DEFAULT_API_KEY_ENV,
            "temperature": 0.7,
            "retry_temperature": 0.0
        },
        "retrieval": {
            "top_k": DEFAULT_TOP_K,
            "document_type": DEFAULT_DOCUMENT_TYPE
        },
        "agent": {
            "max_iterations": 8,
            "memory_turns": 10,
            "max_sessions": 256
        },
        "graph": {
            "max_steps": 10
        },
        "server": {
            "host": "127.0.0.1",
            "port": 8000,
            "default_strategy": "fixed-graph",
            "cors_allowed_origins": []
        }
    })
}
