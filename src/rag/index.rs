//! Similarity-search oracle behind the retriever.

use async_trait::async_trait;

use super::document::Document;
use crate::core::errors::ApiError;

/// Read-only similarity search over a pre-populated index.
///
/// Results are ranked best-first. For an unchanged index the same query must
/// return the same documents in the same order.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>, ApiError>;

    /// Number of indexed documents.
    async fn count(&self) -> Result<usize, ApiError>;
}
