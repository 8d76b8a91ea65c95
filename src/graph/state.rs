// Graph State
// Shared record threaded through the fixed research graph

use serde::Serialize;

use super::node::GraphError;

/// Keys of [`PipelineState`]. Each is written by exactly one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKey {
    Retrieved,
    Validated,
    Answer,
}

impl StateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Retrieved => "retrieved",
            StateKey::Validated => "validated",
            StateKey::Answer => "answer",
        }
    }
}

/// `question` is set at construction; every other key is written once, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineState {
    question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retrieved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
}

impl PipelineState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            retrieved: None,
            validated: None,
            answer: None,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn retrieved(&self) -> Option<&str> {
        self.retrieved.as_deref()
    }

    pub fn validated(&self) -> Option<&str> {
        self.validated.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn get(&self, key: StateKey) -> Option<&str> {
        match key {
            StateKey::Retrieved => self.retrieved(),
            StateKey::Validated => self.validated(),
            StateKey::Answer => self.answer(),
        }
    }

    /// Writes `key`. A second write to the same key is an error.
    pub fn set(
        &mut self,
        writer: &str,
        key: StateKey,
        value: impl Into<String>,
    ) -> Result<(), GraphError> {
        let slot = match key {
            StateKey::Retrieved => &mut self.retrieved,
            StateKey::Validated => &mut self.validated,
            StateKey::Answer => &mut self.answer,
        };
        if slot.is_some() {
            return Err(GraphError::new(
                writer,
                format!("State key '{}' was already written", key.as_str()),
            ));
        }
        *slot = Some(value.into());
        Ok(())
    }

    /// Reads a key an upstream node must have produced.
    pub fn require(&self, reader: &str, key: StateKey) -> Result<&str, GraphError> {
        self.get(key).ok_or_else(|| {
            GraphError::new(
                reader,
                format!("State key '{}' has not been written yet", key.as_str()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_write_once() {
        let mut state = PipelineState::new("q");
        state.set("retrieve", StateKey::Retrieved, "[]").unwrap();

        let err = state.set("retrieve", StateKey::Retrieved, "[1]").unwrap_err();
        assert_eq!(err.node_id, "retrieve");
        assert_eq!(state.retrieved(), Some("[]"));
    }

    #[test]
    fn require_reports_missing_key() {
        let state = PipelineState::new("q");
        let err = state.require("validate", StateKey::Retrieved).unwrap_err();
        assert!(err.message.contains("retrieved"));
    }

    #[test]
    fn serializes_only_written_keys() {
        let mut state = PipelineState::new("what changed?");
        state.set("retrieve", StateKey::Retrieved, "[]").unwrap();
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["question"], "what changed?");
        assert_eq!(value["retrieved"], "[]");
        assert!(value.get("answer").is_none());
    }
}
