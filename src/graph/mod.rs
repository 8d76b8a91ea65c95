// Research Graph Module
// LangGraph-style StateGraph for the fixed retrieve -> validate -> synthesize run

pub mod builder;
pub mod node;
pub mod runtime;
pub mod state;

pub mod nodes;

pub use builder::build_research_graph;
pub use node::{GraphError, Node, NodeContext, NodeOutput};
pub use runtime::{GraphBuilder, GraphRuntime};
pub use state::{PipelineState, StateKey};
