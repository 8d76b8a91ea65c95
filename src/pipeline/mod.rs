//! Runs a question through either orchestration strategy.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::agent::{ReactAgent, DEFAULT_SESSION};
use crate::core::config::AppConfig;
use crate::core::errors::ApiError;
use crate::graph::{build_research_graph, GraphError, GraphRuntime, NodeContext, PipelineState};
use crate::llm::LlmService;
use crate::rag::VectorIndex;
use crate::tools::{Retriever, Synthesizer, Tool, Toolset, ValidationMode, Validator};

pub mod strategy;
pub mod trace;

pub use strategy::Strategy;
pub use trace::{render_thoughts, Trace, TraceSender, TraceStep};

pub const FALLBACK_ANSWER: &str = "No answer generated.";

/// Result of one run, whichever strategy produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub strategy: Strategy,
    pub answer: String,
    pub steps: Vec<TraceStep>,
    /// Final graph state; only the fixed graph has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PipelineState>,
}

impl PipelineOutcome {
    pub fn thoughts(&self) -> Vec<String> {
        render_thoughts(&self.steps)
    }

    /// Thoughts as a single markdown block.
    pub fn thoughts_markdown(&self) -> String {
        self.thoughts().join("\n---\n")
    }
}

pub struct ResearchPipeline {
    graph: GraphRuntime,
    agent: ReactAgent,
}

impl ResearchPipeline {
    /// Wires both strategies over the same index and model.
    ///
    /// The graph validates in structured mode; the agent's validator tool
    /// writes a free-text review.
    pub fn new(
        index: Arc<dyn VectorIndex>,
        llm: LlmService,
        config: &AppConfig,
    ) -> Result<Self, GraphError> {
        let retriever = Retriever::new(index, &config.retrieval);
        let synthesizer = Synthesizer::new(llm.clone());

        let graph = build_research_graph(
            retriever.clone(),
            Validator::from_config(llm.clone(), ValidationMode::Structured, &config.llm),
            synthesizer.clone(),
            config.graph.max_steps,
        )?;

        let tools = Toolset::new(vec![
            Arc::new(retriever) as Arc<dyn Tool>,
            Arc::new(Validator::from_config(
                llm.clone(),
                ValidationMode::FreeText,
                &config.llm,
            )),
            Arc::new(synthesizer),
        ]);
        let agent = ReactAgent::new(llm, tools, &config.agent);

        Ok(Self { graph, agent })
    }

    pub fn agent(&self) -> &ReactAgent {
        &self.agent
    }

    /// Answers `question`. With `live` set, each step is also sent as it completes.
    pub async fn run(
        &self,
        question: &str,
        strategy: Strategy,
        session_id: Option<&str>,
        live: Option<TraceSender>,
    ) -> Result<PipelineOutcome, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest("Question must not be empty".to_string()));
        }

        let mut trace = match live {
            Some(sender) => Trace::with_live(sender),
            None => Trace::new(),
        };

        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            strategy = %strategy,
            question_len = question.len(),
            "Pipeline run started"
        );

        let (answer, state) = match strategy {
            Strategy::FixedGraph => {
                let mut state = PipelineState::new(question);
                self.graph
                    .run(&mut state, &mut NodeContext::new(&mut trace))
                    .await?;
                let answer = state.answer().unwrap_or(FALLBACK_ANSWER).to_string();
                (answer, Some(state))
            }
            Strategy::AgentDriven => {
                let session = session_id
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .unwrap_or(DEFAULT_SESSION);
                let outcome = self.agent.run(question, session, &mut trace).await?;
                (outcome.answer, None)
            }
        };

        let answer = if answer.trim().is_empty() {
            tracing::warn!(%run_id, "Run produced an empty answer; using fallback");
            FALLBACK_ANSWER.to_string()
        } else {
            answer
        };

        let steps = trace.into_steps();
        tracing::info!(%run_id, steps = steps.len(), "Pipeline run finished");

        Ok(PipelineOutcome {
            strategy,
            answer,
            steps,
            state,
        })
    }
}
