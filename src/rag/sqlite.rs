//! SQLite-backed vector index.
//!
//! Documents and their embeddings live in one table; search embeds the query
//! through the LLM provider and scores every row by cosine similarity.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::document::{Document, Metadata};
use super::index::VectorIndex;
use crate::core::errors::ApiError;
use crate::llm::LlmService;

pub struct SqliteVectorIndex {
    pool: SqlitePool,
    embedder: LlmService,
    db_path: PathBuf,
}

struct ScoredDocument {
    doc_id: String,
    score: f32,
    document: Document,
}

impl SqliteVectorIndex {
    pub async fn open(db_path: impl AsRef<Path>, embedder: LlmService) -> Result<Self, ApiError> {
        let db_path = db_path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let index = Self {
            pool,
            embedder,
            db_path,
        };
        index.init_schema().await?;
        Ok(index)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    /// Loads documents with precomputed embeddings. Building the index (parsing
    /// and embedding source files) happens outside this crate.
    pub async fn insert_batch(&self, items: Vec<(String, Document, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (doc_id, document, embedding) in &items {
            let blob = serialize_embedding(embedding);
            let metadata_str = Value::Object(document.metadata.clone()).to_string();

            sqlx::query(
                "INSERT OR REPLACE INTO documents (doc_id, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(doc_id)
            .bind(&document.content)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
        let metadata_str: String = row.get("metadata");
        let metadata = match serde_json::from_str::<Value>(&metadata_str) {
            Ok(Value::Object(map)) => map,
            _ => Metadata::new(),
        };

        Document::new(row.get::<String, _>("content"), metadata)
    }

    async fn ranked(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ScoredDocument>, ApiError> {
        let rows = sqlx::query("SELECT doc_id, content, metadata, embedding FROM documents")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::upstream)?;

        let mut scored: Vec<ScoredDocument> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Option<Vec<u8>> = row.get("embedding");
                let embedding_bytes = embedding_bytes.filter(|bytes| !bytes.is_empty())?;
                let stored = deserialize_embedding(&embedding_bytes);

                Some(ScoredDocument {
                    doc_id: row.get("doc_id"),
                    score: cosine_similarity(query_embedding, &stored),
                    document: Self::row_to_document(row),
                })
            })
            .collect();

        // doc_id breaks ties so equal scores keep a stable order across calls.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        scored.truncate(k);

        Ok(scored)
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>, ApiError> {
        let embeddings = self.embedder.embed(&[query.to_string()]).await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("embedding provider returned no vector".to_string()))?;

        let ranked = self.ranked(&query_embedding, k).await?;
        tracing::debug!(
            hits = ranked.len(),
            top_score = ranked.first().map(|s| s.score),
            "Index search complete"
        );

        Ok(ranked.into_iter().map(|s| s.document).collect())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::upstream)?;

        Ok(count as usize)
    }
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use serde_json::json;

    async fn test_index(dir: &tempfile::TempDir, query_vector: Vec<f32>) -> SqliteVectorIndex {
        let llm = ScriptedLlm::new(Vec::<String>::new()).with_embedding(query_vector);
        SqliteVectorIndex::open(dir.path().join("index.db"), llm.service())
            .await
            .unwrap()
    }

    fn make_doc(content: &str, doc_type: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("type".to_string(), json!(doc_type));
        Document::new(content, metadata)
    }

    #[test]
    fn embedding_bytes_round_trip() {
        let vector = vec![0.25_f32, -1.5, 3.0];
        assert_eq!(deserialize_embedding(&serialize_embedding(&vector)), vector);
    }

    #[test]
    fn cosine_handles_mismatch_and_zero_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let index = test_index(&dir, vec![1.0, 0.0]).await;

        index
            .insert_batch(vec![
                ("d1".to_string(), make_doc("far", "NarrativeText"), vec![0.0, 1.0]),
                ("d2".to_string(), make_doc("near", "NarrativeText"), vec![0.9, 0.1]),
                ("d3".to_string(), make_doc("exact", "Title"), vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 3);

        let results = index.search("inflation", 2).await.unwrap();
        let contents: Vec<&str> = results.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["exact", "near"]);
        assert_eq!(results[0].doc_type(), Some("Title"));
    }

    #[tokio::test]
    async fn equal_scores_keep_stable_order() {
        let dir = tempfile::tempdir().unwrap();
        let index = test_index(&dir, vec![1.0, 0.0]).await;

        index
            .insert_batch(vec![
                ("b".to_string(), make_doc("second", "NarrativeText"), vec![1.0, 0.0]),
                ("a".to_string(), make_doc("first", "NarrativeText"), vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let first = index.search("q", 10).await.unwrap();
        let second = index.search("q", 10).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].content, "first");
    }

    #[tokio::test]
    async fn reopening_keeps_documents() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = test_index(&dir, vec![1.0]).await;
            index
                .insert_batch(vec![("d1".to_string(), make_doc("kept", "NarrativeText"), vec![1.0])])
                .await
                .unwrap();
        }

        let reopened = test_index(&dir, vec![1.0]).await;
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert_eq!(reopened.db_path(), dir.path().join("index.db").as_path());
    }
}
