//! Retrieval-augmented research assistant.
//!
//! A question is answered by three stages (retrieve, validate, synthesize)
//! driven either by a fixed graph or by a ReAct agent choosing stages as tools.

pub mod agent;
pub mod core;
pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod rag;
pub mod server;
pub mod state;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;
