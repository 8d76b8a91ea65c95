use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// OpenAI-compatible chat/embedding endpoint with bearer auth.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    fn chat_body(request: &ChatRequest, model_id: &str) -> Value {
        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(temperature) = request.temperature {
                obj.insert("temperature".to_string(), json!(temperature));
            }
            if let Some(max_tokens) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(max_tokens));
            }
            if let Some(stop) = &request.stop {
                obj.insert("stop".to_string(), json!(stop));
            }
        }

        body
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = Self::chat_body(&request, model_id);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "chat completion failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "embedding request failed ({}): {}",
                status, text
            )));
        }

        let mut payload: EmbeddingResponse = res.json().await.map_err(ApiError::upstream)?;
        payload.data.sort_by_key(|item| item.index);

        Ok(payload.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAiProvider::new("http://localhost:1234/", "key");
        assert_eq!(provider.base_url, "http://localhost:1234");
    }

    #[test]
    fn chat_body_includes_only_set_parameters() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).with_temperature(Some(0.0));
        let body = OpenAiProvider::chat_body(&request, "gpt-4-turbo");

        assert_eq!(body["model"], "gpt-4-turbo");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["temperature"], 0.0);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn chat_body_carries_stop_sequences() {
        let request = ChatRequest::prompt("q").with_stop(vec!["\nObservation:".to_string()]);
        let body = OpenAiProvider::chat_body(&request, "m");
        assert_eq!(body["stop"][0], "\nObservation:");
    }
}
