use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// The language-model oracle. Implementations carry no schema guarantees about
/// the returned text; callers validate structure themselves.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError>;

    /// generate embeddings
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}
