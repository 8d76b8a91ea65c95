use std::sync::Arc;

use async_trait::async_trait;

use super::Tool;
use crate::core::config::defaults::{DEFAULT_DOCUMENT_TYPE, DEFAULT_TOP_K};
use crate::core::config::RetrievalConfig;
use crate::core::errors::ApiError;
use crate::rag::{serialize_documents, Document, VectorIndex};

pub const RETRIEVER_TOOL_NAME: &str = "retrieve_context";

/// Stage 1: top-K similarity search, keeping only one document type.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    document_type: String,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, config: &RetrievalConfig) -> Self {
        Self {
            index,
            top_k: config.top_k,
            document_type: config.document_type.clone(),
        }
    }

    /// K=20, `NarrativeText` only.
    pub fn with_defaults(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            index,
            top_k: DEFAULT_TOP_K,
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
        }
    }

    pub async fn retrieve_documents(&self, query: &str) -> Result<Vec<Document>, ApiError> {
        let hits = self.index.search(query, self.top_k).await?;
        let total = hits.len();

        let kept: Vec<Document> = hits
            .into_iter()
            .filter(|doc| doc.doc_type() == Some(self.document_type.as_str()))
            .collect();

        tracing::info!(
            hits = total,
            kept = kept.len(),
            document_type = %self.document_type,
            "Retrieved documents"
        );

        Ok(kept)
    }

    /// `retrieve(query) -> serialized document list`
    pub async fn retrieve(&self, query: &str) -> Result<String, ApiError> {
        let docs = self.retrieve_documents(query).await?;
        Ok(serialize_documents(&docs))
    }
}

#[async_trait]
impl Tool for Retriever {
    fn name(&self) -> &'static str {
        RETRIEVER_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Retrieve only NarrativeText-type documents relevant to the query as a JSON string."
    }

    async fn run(&self, input: &str) -> Result<String, ApiError> {
        self.retrieve(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::Interchange;
    use crate::testing::{typed_doc, StaticIndex};

    fn inflation_hits() -> Vec<Document> {
        (0..20)
            .map(|i| {
                let doc_type = if i % 5 < 3 { "NarrativeText" } else { "Table" };
                typed_doc(&format!("inflation passage {}", i), doc_type, i)
            })
            .collect()
    }

    #[tokio::test]
    async fn keeps_only_narrative_text_hits() {
        let hits = inflation_hits();
        let expected: Vec<Document> = hits
            .iter()
            .filter(|d| d.doc_type() == Some("NarrativeText"))
            .cloned()
            .collect();
        assert_eq!(expected.len(), 12);

        let retriever = Retriever::with_defaults(Arc::new(StaticIndex::new(hits)));
        let output = retriever.retrieve("inflation trends").await.unwrap();

        match Interchange::parse(&output) {
            Interchange::RawList(docs) => assert_eq!(docs, expected),
            other => panic!("expected a bare list, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn requests_top_k_from_index() {
        let hits: Vec<Document> = (0..30)
            .map(|i| typed_doc(&format!("p{}", i), "NarrativeText", i))
            .collect();
        let retriever = Retriever::with_defaults(Arc::new(StaticIndex::new(hits)));

        let docs = retriever.retrieve_documents("q").await.unwrap();
        assert_eq!(docs.len(), 20);
    }

    #[tokio::test]
    async fn missing_type_is_dropped() {
        let index = StaticIndex::new(vec![
            Document::from_text("untyped"),
            typed_doc("typed", "NarrativeText", 1),
        ]);
        let retriever = Retriever::with_defaults(Arc::new(index));

        let docs = retriever.retrieve_documents("q").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "typed");
    }

    #[tokio::test]
    async fn same_query_returns_same_output() {
        let retriever = Retriever::with_defaults(Arc::new(StaticIndex::new(inflation_hits())));

        let first = retriever.retrieve("inflation trends").await.unwrap();
        let second = retriever.retrieve("inflation trends").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn index_failure_propagates() {
        let retriever = Retriever::with_defaults(Arc::new(StaticIndex::unavailable()));
        let err = retriever.retrieve("q").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn no_matches_serializes_empty_list() {
        let index = StaticIndex::new(vec![typed_doc("t", "Title", 1)]);
        let retriever = Retriever::with_defaults(Arc::new(index));
        assert_eq!(retriever.retrieve("q").await.unwrap(), "[]");
    }
}
