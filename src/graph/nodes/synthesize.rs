// Synthesize Node
// Writes the final answer, substituting the fallback when synthesis fails

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{PipelineState, StateKey};
use crate::pipeline::{TraceStep, FALLBACK_ANSWER};
use crate::tools::Synthesizer;

pub struct SynthesizeNode {
    synthesizer: Synthesizer,
}

impl SynthesizeNode {
    pub fn new(synthesizer: Synthesizer) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Node for SynthesizeNode {
    fn id(&self) -> &'static str {
        "synthesize"
    }

    async fn execute(
        &self,
        state: &mut PipelineState,
        ctx: &mut NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let validated = state.require(self.id(), StateKey::Validated)?.to_string();

        let answer = match self.synthesizer.synthesize(&validated).await {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => {
                tracing::warn!("Synthesizer returned an empty answer; using fallback");
                ctx.emit(TraceStep::Notice {
                    message: "Synthesis produced no text.".to_string(),
                });
                FALLBACK_ANSWER.to_string()
            }
            Err(err) => {
                tracing::warn!(error = %err, "Synthesis failed; using fallback");
                ctx.emit(TraceStep::Notice {
                    message: format!("Synthesis failed: {}", err),
                });
                FALLBACK_ANSWER.to_string()
            }
        };

        state.set(self.id(), StateKey::Answer, answer)?;
        Ok(NodeOutput::Final)
    }
}
