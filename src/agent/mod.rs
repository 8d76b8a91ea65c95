//! Agent-driven strategy: a ReAct loop that picks research tools by name.

pub mod executor;
pub mod instructions;
pub mod memory;
pub mod parser;

pub use executor::{AgentOutcome, ReactAgent, ITERATION_LIMIT_ANSWER};
pub use memory::{ConversationMemory, Turn, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION};
pub use parser::{parse_agent_output, AgentAction, AgentStep, ParseError};
