use crate::core::config::AgentConfig;
use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, LlmService};
use crate::pipeline::{Trace, TraceStep, FALLBACK_ANSWER};
use crate::tools::Toolset;

use super::instructions::build_react_prompt;
use super::memory::ConversationMemory;
use super::parser::{parse_agent_output, AgentStep};

pub const ITERATION_LIMIT_ANSWER: &str =
    "Agent stopped after reaching the maximum number of reasoning steps.";

/// Generation stops here so the model cannot invent its own observations.
pub const OBSERVATION_STOP: &str = "\nObservation:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    pub answer: String,
    pub iterations: usize,
    /// False when the iteration limit ended the loop.
    pub finished: bool,
}

/// Reason/act loop over a set of tools with per-session conversation memory.
pub struct ReactAgent {
    llm: LlmService,
    tools: Toolset,
    max_iterations: usize,
    memory: ConversationMemory,
}

impl ReactAgent {
    pub fn new(llm: LlmService, tools: Toolset, config: &AgentConfig) -> Self {
        Self {
            llm,
            tools,
            max_iterations: config.max_iterations,
            memory: ConversationMemory::new(config.memory_turns, config.max_sessions),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_limits(
        llm: LlmService,
        tools: Toolset,
        max_iterations: usize,
        memory_turns: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            max_iterations,
            memory: ConversationMemory::new(memory_turns, super::memory::DEFAULT_MAX_SESSIONS),
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub async fn run(
        &self,
        question: &str,
        session_id: &str,
        trace: &mut Trace,
    ) -> Result<AgentOutcome, ApiError> {
        let history = self.memory.transcript(session_id).await;
        let mut scratchpad = String::new();

        for iteration in 1..=self.max_iterations {
            let prompt = build_react_prompt(&self.tools, &history, question, &scratchpad);
            let request = ChatRequest::prompt(prompt).with_stop(vec![OBSERVATION_STOP.to_string()]);
            let output = self.llm.chat(request).await?;

            let observation = match parse_agent_output(&output) {
                Ok(AgentStep::Final { thought, answer }) => {
                    let answer = if answer.trim().is_empty() {
                        tracing::warn!(iteration, "Agent gave an empty final answer; using fallback");
                        FALLBACK_ANSWER.to_string()
                    } else {
                        answer
                    };
                    tracing::info!(
                        iteration,
                        thought = %thought,
                        answer_len = answer.len(),
                        "Agent finished"
                    );
                    self.memory.record(session_id, question, &answer).await;
                    return Ok(AgentOutcome {
                        answer,
                        iterations: iteration,
                        finished: true,
                    });
                }
                Ok(AgentStep::Action(action)) => {
                    let observation = match self.tools.get(&action.tool) {
                        Some(tool) => tool.run(&action.input).await?,
                        None => format!(
                            "{} is not a valid tool, try one of [{}].",
                            action.tool,
                            self.tools.names().join(", ")
                        ),
                    };
                    tracing::info!(
                        iteration,
                        thought = %action.thought,
                        tool = %action.tool,
                        input_len = action.input.len(),
                        observation_len = observation.len(),
                        "Agent step"
                    );
                    trace.push(TraceStep::ToolCall {
                        iteration,
                        thought: action.thought,
                        tool: action.tool,
                        input: action.input,
                        observation: observation.clone(),
                    });
                    observation
                }
                Err(err) => {
                    let observation = err.to_string();
                    tracing::warn!(
                        iteration,
                        output_len = output.len(),
                        error = %observation,
                        "Agent output could not be parsed"
                    );
                    trace.push(TraceStep::InvalidStep {
                        iteration,
                        output: output.clone(),
                        observation: observation.clone(),
                    });
                    observation
                }
            };

            scratchpad.push_str(&output);
            scratchpad.push_str(&format!("\nObservation: {}\nThought: ", observation));
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            "Agent hit the iteration limit without a final answer"
        );
        self.memory
            .record(session_id, question, ITERATION_LIMIT_ANSWER)
            .await;
        Ok(AgentOutcome {
            answer: ITERATION_LIMIT_ANSWER.to_string(),
            iterations: self.max_iterations,
            finished: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{typed_doc, ScriptedLlm, StaticIndex};
    use crate::tools::{Retriever, Synthesizer, Tool, ValidationMode, Validator};

    fn agent(llm: &ScriptedLlm, index: StaticIndex, max_iterations: usize) -> ReactAgent {
        let tools = Toolset::new(vec![
            Arc::new(Retriever::with_defaults(Arc::new(index))) as Arc<dyn Tool>,
            Arc::new(Validator::new(llm.service(), ValidationMode::FreeText)),
            Arc::new(Synthesizer::new(llm.service())),
        ]);
        ReactAgent::with_limits(llm.service(), tools, max_iterations, 4)
    }

    #[tokio::test]
    async fn executes_tool_then_answers() {
        let llm = ScriptedLlm::new(vec![
            " I need sources.\nAction: retrieve_context\nAction Input: \"inflation\"",
            " I now know the final answer.\nFinal Answer: Prices are cooling.",
        ]);
        let index = StaticIndex::new(vec![typed_doc("CPI fell.", "NarrativeText", 1)]);
        let agent = agent(&llm, index, 5);
        let mut trace = Trace::new();

        let outcome = agent.run("inflation?", "s1", &mut trace).await.unwrap();

        assert_eq!(outcome.answer, "Prices are cooling.");
        assert_eq!(outcome.iterations, 2);
        assert!(outcome.finished);

        match &trace.steps()[0] {
            TraceStep::ToolCall {
                tool,
                input,
                observation,
                ..
            } => {
                assert_eq!(tool, "retrieve_context");
                assert_eq!(input, "inflation");
                assert!(observation.contains("CPI fell."));
            }
            other => panic!("unexpected step {:?}", other),
        }

        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].stop, Some(vec![OBSERVATION_STOP.to_string()]));
        assert!(calls[1].prompt.contains("Action Input: \"inflation\"\nObservation: [{"));
        assert!(calls[1].prompt.ends_with("\nThought: "));
    }

    #[tokio::test]
    async fn unknown_tool_gets_corrective_observation() {
        let llm = ScriptedLlm::new(vec![
            "Action: web_search\nAction Input: cpi",
            "Final Answer: ok",
        ]);
        let agent = agent(&llm, StaticIndex::new(vec![]), 5);
        let mut trace = Trace::new();

        agent.run("q", "s", &mut trace).await.unwrap();

        match &trace.steps()[0] {
            TraceStep::ToolCall { observation, .. } => assert_eq!(
                observation,
                "web_search is not a valid tool, try one of [retrieve_context, validate_sources, synthesize_answer]."
            ),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[tokio::test]
    async fn format_errors_are_fed_back() {
        let llm = ScriptedLlm::new(vec!["I am not sure what to do.", "Final Answer: fine"]);
        let agent = agent(&llm, StaticIndex::new(vec![]), 5);
        let mut trace = Trace::new();

        let outcome = agent.run("q", "s", &mut trace).await.unwrap();

        assert_eq!(outcome.answer, "fine");
        assert!(matches!(trace.steps()[0], TraceStep::InvalidStep { .. }));
        assert!(llm.calls()[1]
            .prompt
            .contains("Observation: Invalid Format: Missing 'Action:' after 'Thought:'"));
    }

    #[tokio::test]
    async fn iteration_limit_produces_designated_answer() {
        let llm = ScriptedLlm::new(vec!["rambling", "more rambling"]);
        let agent = agent(&llm, StaticIndex::new(vec![]), 2);
        let mut trace = Trace::new();

        let outcome = agent.run("q", "s", &mut trace).await.unwrap();

        assert_eq!(outcome.answer, ITERATION_LIMIT_ANSWER);
        assert!(!outcome.finished);
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn memory_carries_prior_turns_into_the_prompt() {
        let llm = ScriptedLlm::new(vec!["Final Answer: first", "Final Answer: second"]);
        let agent = agent(&llm, StaticIndex::new(vec![]), 3);

        agent.run("one?", "s", &mut Trace::new()).await.unwrap();
        agent.run("two?", "s", &mut Trace::new()).await.unwrap();

        let calls = llm.calls();
        assert!(!calls[0].prompt.contains("Previous conversation"));
        assert!(calls[1].prompt.contains("Human: one?\nAI: first"));
        assert_eq!(agent.memory().turns("s").await.len(), 2);
    }

    #[tokio::test]
    async fn empty_final_answer_is_remembered_as_fallback() {
        let llm = ScriptedLlm::new(vec!["Final Answer:   ", "Final Answer: second"]);
        let agent = agent(&llm, StaticIndex::new(vec![]), 3);

        let outcome = agent.run("one?", "s", &mut Trace::new()).await.unwrap();
        assert_eq!(outcome.answer, FALLBACK_ANSWER);
        agent.run("two?", "s", &mut Trace::new()).await.unwrap();

        let turns = agent.memory().turns("s").await;
        assert_eq!(turns[0].answer, FALLBACK_ANSWER);
        assert!(llm.calls()[1]
            .prompt
            .contains(&format!("Human: one?\nAI: {}", FALLBACK_ANSWER)));
    }

    #[tokio::test]
    async fn tool_oracle_failure_propagates() {
        let llm = ScriptedLlm::new(vec!["Action: retrieve_context\nAction Input: q"]);
        let agent = agent(&llm, StaticIndex::unavailable(), 3);

        let err = agent.run("q", "s", &mut Trace::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }
}
