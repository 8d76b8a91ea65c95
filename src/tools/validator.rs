use async_trait::async_trait;

use super::prompts::{review_prompt, structured_validation_prompt};
use super::Tool;
use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;
use crate::llm::LlmService;
use crate::rag::{strip_code_fences, Document, Interchange, ValidatedSet, ValidationStatus};

pub const VALIDATOR_TOOL_NAME: &str = "validate_sources";

pub const PARSE_FAILURE_NOTE: &str =
    "Could not parse model output as JSON. Returning all documents.";

const TRIMMED_NOTE: &str =
    "Model output listed documents that were not in the input; they were removed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Prose review, returned verbatim.
    FreeText,
    /// `{"filtered": [...], "commentary": "..."}` with one retry and a keep-all fallback.
    Structured,
}

/// Stage 2: asks the model to judge clarity, relevance and credibility.
#[derive(Clone)]
pub struct Validator {
    llm: LlmService,
    mode: ValidationMode,
    temperature: Option<f64>,
    retry_temperature: f64,
}

impl Validator {
    pub fn new(llm: LlmService, mode: ValidationMode) -> Self {
        Self {
            llm,
            mode,
            temperature: Some(0.7),
            retry_temperature: 0.0,
        }
    }

    /// The retry always samples below the first attempt; a configured retry
    /// temperature that is not lower falls back to fully greedy decoding.
    pub fn from_config(llm: LlmService, mode: ValidationMode, config: &LlmConfig) -> Self {
        let retry_temperature = if config.retry_temperature < config.temperature {
            config.retry_temperature
        } else {
            tracing::warn!(
                temperature = config.temperature,
                retry_temperature = config.retry_temperature,
                "Retry temperature is not below the first attempt; retrying at 0.0"
            );
            0.0
        };
        Self {
            llm,
            mode,
            temperature: Some(config.temperature),
            retry_temperature,
        }
    }

    /// `validate(serialized_documents) -> serialized validated set`
    pub async fn validate(&self, input: &str) -> Result<String, ApiError> {
        let parsed = Interchange::parse(input);
        if !parsed.is_parsed() {
            tracing::warn!(
                input_len = input.len(),
                "Validator input is not a document list; treating it as one document"
            );
        }
        let docs = parsed.into_documents();

        match self.mode {
            ValidationMode::FreeText => self.llm.complete(&review_prompt(&docs), None).await,
            ValidationMode::Structured => self.validate_structured(docs).await,
        }
    }

    async fn validate_structured(&self, docs: Vec<Document>) -> Result<String, ApiError> {
        let prompt = structured_validation_prompt(&docs);
        let attempts = [self.temperature, Some(self.retry_temperature)];

        for (attempt, temperature) in attempts.into_iter().enumerate() {
            let reply = self.llm.complete(&prompt, temperature).await?;
            if let Some(accepted) = accept_structured_reply(&reply, &docs) {
                tracing::debug!(attempt = attempt + 1, "Structured validation parsed");
                return Ok(accepted);
            }
            tracing::warn!(
                attempt = attempt + 1,
                temperature = ?temperature,
                reply_len = reply.len(),
                "Validator reply was not a JSON document set"
            );
        }

        tracing::warn!(
            documents = docs.len(),
            "Validator output unparsable after retry; keeping every document"
        );
        Ok(ValidatedSet {
            filtered: docs,
            commentary: PARSE_FAILURE_NOTE.to_string(),
            status: Some(ValidationStatus::UnparsedFallback),
        }
        .to_json())
    }
}

/// Returns the text to pass downstream, or `None` when the reply must be retried.
///
/// A well-formed reply is returned exactly as the model wrote it (minus code
/// fences). A reply that lists more documents than it was given is cut back to
/// documents present in the input.
fn accept_structured_reply(reply: &str, input: &[Document]) -> Option<String> {
    let cleaned = strip_code_fences(reply);

    let (filtered, commentary) = match Interchange::parse(cleaned) {
        Interchange::Wrapped {
            filtered,
            commentary,
        } => {
            if filtered.len() <= input.len() {
                return Some(cleaned.to_string());
            }
            (filtered, commentary.unwrap_or_default())
        }
        Interchange::RawList(filtered) => (filtered, String::new()),
        Interchange::Unparseable(_) => return None,
    };

    let expanded = filtered.len() > input.len();
    let mut kept: Vec<Document> = filtered
        .into_iter()
        .filter(|doc| input.iter().any(|candidate| candidate.content == doc.content))
        .collect();
    kept.truncate(input.len());

    let (commentary, status) = if expanded {
        let commentary = if commentary.is_empty() {
            TRIMMED_NOTE.to_string()
        } else {
            format!("{} ({})", commentary, TRIMMED_NOTE)
        };
        (commentary, Some(ValidationStatus::Trimmed))
    } else {
        (commentary, None)
    };

    Some(
        ValidatedSet {
            filtered: kept,
            commentary,
            status,
        }
        .to_json(),
    )
}

#[async_trait]
impl Tool for Validator {
    fn name(&self) -> &'static str {
        VALIDATOR_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Evaluates clarity, relevance, and credibility of retrieved documents"
    }

    async fn run(&self, input: &str) -> Result<String, ApiError> {
        self.validate(input).await
    }
}
