// Node trait and types
// Base abstraction for graph nodes

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::pipeline::{Trace, TraceStep};

use super::state::PipelineState;

/// Context passed to nodes during execution
pub struct NodeContext<'a> {
    /// Intermediate artifacts for the caller
    pub trace: &'a mut Trace,
}

impl<'a> NodeContext<'a> {
    pub fn new(trace: &'a mut Trace) -> Self {
        Self { trace }
    }

    pub fn emit(&mut self, step: TraceStep) {
        self.trace.push(step);
    }
}

/// Output from a node execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutput {
    /// Follow the node's outgoing edge
    Continue,
    /// Graph execution complete
    Final,
}

/// Graph execution error
///
/// Includes an optional `execution_trace` to record the sequence of node IDs
/// visited before the error occurred, aiding production debugging.
#[derive(Debug)]
pub struct GraphError {
    pub node_id: String,
    pub message: String,
    /// Ordered list of node IDs executed before this error, most-recent last.
    pub execution_trace: Vec<String>,
    /// Set when the failure came from the LLM or the index.
    pub upstream: bool,
}

impl GraphError {
    pub fn new(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            message: message.into(),
            execution_trace: Vec::new(),
            upstream: false,
        }
    }

    /// Wraps a stage failure raised inside `node_id`.
    pub fn stage(node_id: impl Into<String>, err: ApiError) -> Self {
        let upstream = matches!(err, ApiError::Upstream(_));
        Self {
            upstream,
            ..Self::new(node_id, err.to_string())
        }
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.execution_trace = trace;
        self
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        let upstream = err.upstream;
        let message = err.to_string();
        if upstream {
            ApiError::Upstream(message)
        } else {
            ApiError::internal(message)
        }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.execution_trace.is_empty() {
            write!(f, "GraphError in {}: {}", self.node_id, self.message)
        } else {
            write!(
                f,
                "GraphError in {} (trace: {}): {}",
                self.node_id,
                self.execution_trace.join(" -> "),
                self.message
            )
        }
    }
}

impl std::error::Error for GraphError {}

/// Node trait - all graph nodes implement this
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique identifier for this node
    fn id(&self) -> &'static str;

    /// Execute the node logic
    async fn execute(
        &self,
        state: &mut PipelineState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_stage_errors_stay_upstream() {
        let err = GraphError::stage("retrieve", ApiError::Upstream("index down".into()))
            .with_trace(vec!["retrieve".into()]);
        match ApiError::from(err) {
            ApiError::Upstream(message) => {
                assert!(message.contains("retrieve"));
                assert!(message.contains("index down"));
            }
            other => panic!("expected upstream, got {:?}", other),
        }
    }

    #[test]
    fn structural_errors_are_internal() {
        let err = GraphError::new("runtime", "No entry node set");
        assert!(matches!(ApiError::from(err), ApiError::Internal(_)));
    }
}
