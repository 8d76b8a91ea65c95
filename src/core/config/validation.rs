use serde_json::{Map, Value};

use crate::core::errors::ApiError;
use crate::pipeline::Strategy;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_required_string_field(llm, "llm.base_url", "base_url")?;
        validate_required_string_field(llm, "llm.model", "model")?;
        validate_required_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_required_string_field(llm, "llm.api_key_env", "api_key_env")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_f64_field(llm, "llm.retry_temperature", "retry_temperature", 0.0, 2.0)?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 1_000_000)?;
        validate_retry_below_temperature(llm)?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 10_000)?;
        validate_required_string_field(retrieval, "retrieval.document_type", "document_type")?;
        validate_optional_string_field(retrieval, "retrieval.index_path", "index_path")?;
    }

    if let Some(agent) = expect_optional_object(root, "agent")? {
        validate_u64_field(agent, "agent.max_iterations", "max_iterations", 1, 100)?;
        validate_u64_field(agent, "agent.memory_turns", "memory_turns", 0, 1_000)?;
        validate_u64_field(agent, "agent.max_sessions", "max_sessions", 1, 100_000)?;
    }

    if let Some(graph) = expect_optional_object(root, "graph")? {
        validate_u64_field(graph, "graph.max_steps", "max_steps", 3, 1_000)?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        if let Some(value) = server.get("default_strategy") {
            let Some(text) = value.as_str() else {
                return Err(config_type_error("server.default_strategy", "string"));
            };
            if text.parse::<Strategy>().is_err() {
                return Err(ApiError::Config(format!(
                    "Invalid config at 'server.default_strategy': unknown strategy '{}'",
                    text
                )));
            }
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

/// The structured validator's second attempt must sample more deterministically
/// than the first.
fn validate_retry_below_temperature(llm: &Map<String, Value>) -> Result<(), ApiError> {
    let first = llm.get("temperature").and_then(Value::as_f64);
    let retry = llm.get("retry_temperature").and_then(Value::as_f64);
    if let (Some(first), Some(retry)) = (first, retry) {
        if retry >= first {
            return Err(ApiError::Config(format!(
                "Invalid config at 'llm.retry_temperature': must be lower than llm.temperature ({})",
                first
            )));
        }
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::Config(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
