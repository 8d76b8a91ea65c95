// Graph Builder
// Constructs the fixed research graph using petgraph

use super::node::GraphError;
use super::nodes::{RetrieveNode, SynthesizeNode, ValidateNode};
use super::runtime::{GraphBuilder, GraphRuntime};
use crate::tools::{Retriever, Synthesizer, Validator};

/// retrieve -> validate -> synthesize
pub fn build_research_graph(
    retriever: Retriever,
    validator: Validator,
    synthesizer: Synthesizer,
    max_steps: usize,
) -> Result<GraphRuntime, GraphError> {
    let graph = GraphBuilder::new()
        .entry("retrieve")
        .max_steps(max_steps)
        .node(Box::new(RetrieveNode::new(retriever)))
        .node(Box::new(ValidateNode::new(validator)))
        .node(Box::new(SynthesizeNode::new(synthesizer)))
        .edge("retrieve", "validate")
        .edge("validate", "synthesize")
        .build()?;
    tracing::debug!(path = ?graph.path(), "Research graph built");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::node::NodeContext;
    use crate::graph::state::PipelineState;
    use crate::pipeline::{Trace, TraceStep, FALLBACK_ANSWER};
    use crate::rag::{serialize_documents, Interchange};
    use crate::testing::{typed_doc, ScriptedLlm, StaticIndex};
    use crate::tools::ValidationMode;

    fn graph_with(llm: &ScriptedLlm, index: StaticIndex) -> GraphRuntime {
        build_research_graph(
            Retriever::with_defaults(Arc::new(index)),
            Validator::new(llm.service(), ValidationMode::Structured),
            Synthesizer::new(llm.service()),
            10,
        )
        .unwrap()
    }

    #[test]
    fn graph_is_a_fixed_chain() {
        let llm = ScriptedLlm::new(Vec::<String>::new());
        let graph = graph_with(&llm, StaticIndex::new(vec![]));
        assert_eq!(graph.path(), vec!["retrieve", "validate", "synthesize"]);
        assert!(!graph.has_cycle());
    }

    #[tokio::test]
    async fn each_stage_reads_the_previous_output() {
        let docs = vec![
            typed_doc("Vietnam CPI rose 3.5% in Q1.", "NarrativeText", 1),
            typed_doc("Header", "Title", 1),
            typed_doc("India cooled to 4.8%.", "NarrativeText", 2),
        ];
        let validated = r#"{"filtered":[{"content":"Vietnam CPI rose 3.5% in Q1.","metadata":{}}],"commentary":"kept one"}"#;
        let llm = ScriptedLlm::new(vec![validated, "Inflation diverged across Asia."]);
        let graph = graph_with(&llm, StaticIndex::new(docs.clone()));

        let mut state = PipelineState::new("Summarize inflation trends in Asia");
        let mut trace = Trace::new();
        graph
            .run(&mut state, &mut NodeContext::new(&mut trace))
            .await
            .unwrap();

        let expected_retrieved = serialize_documents(&[docs[0].clone(), docs[2].clone()]);
        assert_eq!(state.retrieved(), Some(expected_retrieved.as_str()));
        assert_eq!(state.validated(), Some(validated));
        assert_eq!(state.answer(), Some("Inflation diverged across Asia."));

        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].prompt.contains("Doc 2 (page 2): India cooled to 4.8%."));
        assert!(calls[1].prompt.ends_with("Vietnam CPI rose 3.5% in Q1."));

        let steps = trace.steps();
        assert_eq!(steps.len(), 2);
        assert!(matches!(steps[0], TraceStep::Retrieved { .. }));
        assert!(matches!(steps[1], TraceStep::Validated { .. }));
    }

    #[tokio::test]
    async fn synthesis_failure_yields_fallback_answer() {
        let llm = ScriptedLlm::new(vec![r#"{"filtered": [], "commentary": "none"}"#]);
        llm.push_error(crate::core::errors::ApiError::Upstream("timeout".into()));
        let graph = graph_with(&llm, StaticIndex::new(vec![]));

        let mut state = PipelineState::new("q");
        let mut trace = Trace::new();
        graph
            .run(&mut state, &mut NodeContext::new(&mut trace))
            .await
            .unwrap();

        assert_eq!(state.answer(), Some(FALLBACK_ANSWER));
        assert!(matches!(trace.steps().last(), Some(TraceStep::Notice { .. })));
    }

    #[tokio::test]
    async fn retrieval_failure_stops_the_run() {
        let llm = ScriptedLlm::new(Vec::<String>::new());
        let graph = graph_with(&llm, StaticIndex::unavailable());

        let mut state = PipelineState::new("q");
        let mut trace = Trace::new();
        let err = graph
            .run(&mut state, &mut NodeContext::new(&mut trace))
            .await
            .unwrap_err();

        assert_eq!(err.node_id, "retrieve");
        assert!(err.upstream);
        assert!(state.retrieved().is_none());
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_retrieval_still_reaches_synthesis() {
        let llm = ScriptedLlm::new(vec![
            r#"{"filtered": [], "commentary": "nothing to keep"}"#,
            "General answer without sources.",
        ]);
        let graph = graph_with(&llm, StaticIndex::new(vec![typed_doc("t", "Table", 1)]));

        let mut state = PipelineState::new("q");
        let mut trace = Trace::new();
        graph
            .run(&mut state, &mut NodeContext::new(&mut trace))
            .await
            .unwrap();

        assert_eq!(state.retrieved(), Some("[]"));
        assert!(matches!(
            Interchange::parse(state.validated().unwrap()),
            Interchange::Wrapped { .. }
        ));
        assert_eq!(state.answer(), Some("General answer without sources."));
    }
}
