use std::sync::Arc;

use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;
use crate::llm::provider::LlmProvider;
use crate::llm::types::ChatRequest;

/// Shared handle over the configured provider. Cheap to clone; each pipeline
/// stage holds its own copy.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
    chat_model: String,
    embedding_model: String,
    default_temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            chat_model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            default_temperature: Some(config.temperature),
            max_tokens: config.max_tokens,
        }
    }

    /// Service with provider defaults only; used where no config is loaded.
    pub fn with_models(
        provider: Arc<dyn LlmProvider>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
            default_temperature: None,
            max_tokens: None,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// `complete(prompt, temperature?) -> text`
    pub async fn complete(&self, prompt: &str, temperature: Option<f64>) -> Result<String, ApiError> {
        self.chat(ChatRequest::prompt(prompt).with_temperature(temperature))
            .await
    }

    pub async fn chat(&self, mut request: ChatRequest) -> Result<String, ApiError> {
        if request.temperature.is_none() {
            request.temperature = self.default_temperature;
        }
        if request.max_tokens.is_none() {
            request.max_tokens = self.max_tokens;
        }

        tracing::debug!(
            provider = self.provider.name(),
            model = %self.chat_model,
            temperature = ?request.temperature,
            messages = request.messages.len(),
            "LLM chat request"
        );

        self.provider.chat(request, &self.chat_model).await
    }

    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.provider.embed(inputs, &self.embedding_model).await
    }
}
