// Validate Node
// Runs the structured validator over the retrieved documents

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{PipelineState, StateKey};
use crate::pipeline::TraceStep;
use crate::tools::Validator;

pub struct ValidateNode {
    validator: Validator,
}

impl ValidateNode {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Node for ValidateNode {
    fn id(&self) -> &'static str {
        "validate"
    }

    async fn execute(
        &self,
        state: &mut PipelineState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let retrieved = state.require(self.id(), StateKey::Retrieved)?.to_string();

        let validated = self
            .validator
            .validate(&retrieved)
            .await
            .map_err(|err| GraphError::stage(self.id(), err))?;

        ctx.emit(TraceStep::Validated {
            output: validated.clone(),
        });
        state.set(self.id(), StateKey::Validated, validated)?;

        Ok(NodeOutput::Continue)
    }
}
