use async_trait::async_trait;

use super::prompts::synthesis_prompt;
use super::Tool;
use crate::core::errors::ApiError;
use crate::llm::LlmService;
use crate::rag::{Document, Interchange};

pub const SYNTHESIZER_TOOL_NAME: &str = "synthesize_answer";

/// Stage 3: one LLM call that turns validated documents into an answer.
#[derive(Clone)]
pub struct Synthesizer {
    llm: LlmService,
}

impl Synthesizer {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }

    /// `synthesize(serialized_validated_documents) -> answer`
    pub async fn synthesize(&self, input: &str) -> Result<String, ApiError> {
        let parsed = Interchange::parse(input);
        if !parsed.is_parsed() {
            tracing::warn!(
                input_len = input.len(),
                "Synthesizer input is not a document set; using the raw text as context"
            );
        }
        let docs = parsed.into_documents();
        let combined = combined_text(&docs);

        tracing::debug!(
            documents = docs.len(),
            context_chars = combined.len(),
            "Synthesizing answer"
        );

        self.llm.complete(&synthesis_prompt(&combined), None).await
    }
}

/// Document bodies joined by blank lines.
pub fn combined_text(docs: &[Document]) -> String {
    docs.iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for Synthesizer {
    fn name(&self) -> &'static str {
        SYNTHESIZER_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Synthesizes a concise answer from validated research documents"
    }

    async fn run(&self, input: &str) -> Result<String, ApiError> {
        self.synthesize(input).await
    }
}
