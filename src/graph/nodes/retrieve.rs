// Retrieve Node
// Writes the serialized top-K document list for the question

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{PipelineState, StateKey};
use crate::pipeline::TraceStep;
use crate::tools::Retriever;

pub struct RetrieveNode {
    retriever: Retriever,
}

impl RetrieveNode {
    pub fn new(retriever: Retriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Node for RetrieveNode {
    fn id(&self) -> &'static str {
        "retrieve"
    }

    async fn execute(
        &self,
        state: &mut PipelineState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let retrieved = self
            .retriever
            .retrieve(state.question())
            .await
            .map_err(|err| GraphError::stage(self.id(), err))?;

        ctx.emit(TraceStep::Retrieved {
            output: retrieved.clone(),
        });
        state.set(self.id(), StateKey::Retrieved, retrieved)?;

        Ok(NodeOutput::Continue)
    }
}
