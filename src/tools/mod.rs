//! Pipeline stages, exposed as named tools.
//!
//! The fixed graph calls them directly; the agent loop looks them up by name.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::ApiError;

pub mod prompts;
pub mod retriever;
pub mod synthesizer;
pub mod validator;

pub use retriever::Retriever;
pub use synthesizer::Synthesizer;
pub use validator::{ValidationMode, Validator};

/// A single text-in, text-out stage.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    /// One-line description shown to the agent.
    fn description(&self) -> &'static str;

    async fn run(&self, input: &str) -> Result<String, ApiError>;
}

/// Ordered set of tools offered to the agent.
#[derive(Clone, Default)]
pub struct Toolset {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolset {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// `name: description` lines, one per tool.
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
