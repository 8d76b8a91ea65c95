//! Reads one model turn of the ReAct loop.
//!
//! The expected shape is the zero-shot ReAct transcript:
//!
//! ```text
//! Thought: ...
//! Action: retrieve_context
//! Action Input: inflation in Southeast Asia
//! ```
//!
//! or `Final Answer: ...`. The JSON decision objects used by tool-calling
//! models (`{"type":"tool_call",...}` / `{"type":"final",...}`) are accepted too.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

const FINAL_ANSWER: &str = "Final Answer:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAction {
    pub thought: String,
    pub tool: String,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Action(AgentAction),
    Final { thought: String, answer: String },
}

/// The message doubles as the corrective observation fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,
    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,
    #[error("Parsing LLM output produced both a final answer and a parse-able action")]
    ActionAndFinalAnswer,
}

pub fn parse_agent_output(text: &str) -> Result<AgentStep, ParseError> {
    let has_final = text.contains(FINAL_ANSWER);

    if let Some(caps) = action_regex().captures(text) {
        if has_final {
            return Err(ParseError::ActionAndFinalAnswer);
        }
        let tool = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let input = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        return Ok(AgentStep::Action(AgentAction {
            thought: clean_thought(&text[..start]),
            tool: tool.to_string(),
            input: clean_action_input(input),
        }));
    }

    if let Some(pos) = text.find(FINAL_ANSWER) {
        return Ok(AgentStep::Final {
            thought: clean_thought(&text[..pos]),
            answer: text[pos + FINAL_ANSWER.len()..].trim().to_string(),
        });
    }

    if let Some(step) = parse_json_decision(text) {
        return Ok(step);
    }

    if action_label_regex().is_match(text) {
        Err(ParseError::MissingActionInput)
    } else {
        Err(ParseError::MissingAction)
    }
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("valid regex")
    })
}

fn action_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Action\s*\d*\s*:").expect("valid regex"))
}

/// Drops a hallucinated observation, then surrounding whitespace and quotes.
fn clean_action_input(raw: &str) -> String {
    let raw = match raw.find("Observation:") {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    raw.trim().trim_matches('"').trim().to_string()
}

fn clean_thought(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("Thought:")
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

fn parse_json_decision(text: &str) -> Option<AgentStep> {
    let value = parse_json_from_text(text)?;
    let action_type = value
        .get("type")
        .or_else(|| value.get("action"))
        .and_then(Value::as_str)
        .unwrap_or("");

    match action_type {
        "tool_call" => {
            let tool = value
                .get("tool_name")
                .or_else(|| value.get("name"))
                .or_else(|| value.get("tool"))
                .and_then(Value::as_str)?;
            let input = match value.get("tool_args").or_else(|| value.get("args")) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Object(map)) => match map
                    .get("input")
                    .or_else(|| map.get("query"))
                    .and_then(Value::as_str)
                {
                    Some(s) => s.to_string(),
                    None => Value::Object(map.clone()).to_string(),
                },
                Some(other) => other.to_string(),
                None => String::new(),
            };
            Some(AgentStep::Action(AgentAction {
                thought: String::new(),
                tool: tool.trim().to_string(),
                input: clean_action_input(&input),
            }))
        }
        "final" => {
            let answer = value
                .get("content")
                .or_else(|| value.get("message"))
                .or_else(|| value.get("response"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            Some(AgentStep::Final {
                thought: String::new(),
                answer,
            })
        }
        _ => None,
    }
}

fn parse_json_from_text(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end]).ok()
}
