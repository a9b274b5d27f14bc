//! Mairie Radar RAG - Retrieval-Augmented Generation
//!
//! Result types, the component contracts for embedding, vector search,
//! retrieval and generation, and the [`RagPipeline`] that chains them.

pub mod generator;
pub mod loader;
pub mod pipeline;
pub mod retriever;

use async_trait::async_trait;
use radar_core::{BudgetDocument, Metadata, RadarResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub use generator::{format_context, LlmGenerator, DEFAULT_PROMPT_TEMPLATE};
pub use loader::VectorStoreLoader;
pub use pipeline::RagPipeline;
pub use retriever::VectorRetriever;

/// Default number of documents retrieved per query.
pub const DEFAULT_K: usize = 5;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// A retrieved document and its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub document: BudgetDocument,
    /// Higher is more relevant
    pub score: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl QueryResult {
    pub fn new(document: BudgetDocument, score: f64) -> Self {
        Self {
            document,
            score,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Answer to one query with the sources it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    pub query: String,
    pub answer: String,
    pub sources: Vec<QueryResult>,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl RagResponse {
    /// Placeholder returned by batch queries for a query that failed.
    pub fn degraded(query: impl Into<String>, error: &impl std::fmt::Display) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("error".to_string(), json!(error.to_string()));
        Self {
            query: query.into(),
            answer: format!("Error processing query: {}", error),
            sources: Vec::new(),
            confidence: 0.0,
            metadata,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.metadata.contains_key("error")
    }
}

/// Per-query knobs.
///
/// `filters` are handed to the retriever untouched. `extra` carries
/// retriever and generator specific options such as `alpha` for hybrid
/// search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub k: usize,
    pub filters: Option<Metadata>,
    pub rerank: bool,
    pub extra: Metadata,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            filters: None,
            rerank: true,
            extra: Metadata::new(),
        }
    }
}

impl QueryOptions {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filters
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value);
        self
    }

    pub fn without_rerank(mut self) -> Self {
        self.rerank = false;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ============================================================================
// COMPONENT TRAITS
// ============================================================================

/// Turns documents and queries into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// One vector per document, in input order.
    async fn embed_documents(&self, documents: &[BudgetDocument]) -> RadarResult<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> RadarResult<Vec<f32>>;

    fn embedding_dimension(&self) -> usize;
}

/// Stores document vectors and searches them.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;

    /// `embeddings[i]` belongs to `documents[i]`.
    async fn add_documents(&self, documents: &[BudgetDocument], embeddings: &[Vec<f32>]) -> RadarResult<bool>;

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        filters: Option<&Metadata>,
    ) -> RadarResult<Vec<QueryResult>>;

    /// Blend of vector and keyword search; `alpha` = 1.0 is pure vector.
    async fn hybrid_search(
        &self,
        query: &str,
        embedding: &[f32],
        k: usize,
        alpha: f64,
        filters: Option<&Metadata>,
    ) -> RadarResult<Vec<QueryResult>>;

    /// Delete by [`BudgetDocument::document_id`].
    async fn delete_documents(&self, document_ids: &[String]) -> RadarResult<bool>;

    async fn health_check(&self) -> bool;
}

/// Finds documents relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        filters: Option<&Metadata>,
        extra: &Metadata,
    ) -> RadarResult<Vec<QueryResult>>;

    /// Reorder `results` by relevance to `query`.
    async fn rerank(&self, query: &str, results: Vec<QueryResult>) -> RadarResult<Vec<QueryResult>>;
}

/// Writes answers from retrieved context.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, query: &str, context: &[QueryResult], extra: &Metadata) -> RadarResult<String>;

    fn prompt_template(&self) -> &str;

    async fn estimate_confidence(&self, query: &str, answer: &str, context: &[QueryResult]) -> RadarResult<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::{RagError, RadarError, SourceType};

    #[test]
    fn test_query_options_defaults() {
        let options = QueryOptions::default();
        assert_eq!(options.k, 5);
        assert!(options.rerank);
        assert!(options.filters.is_none());

        let parsed: QueryOptions = serde_json::from_str(r#"{"k": 3}"#).unwrap();
        assert_eq!(parsed.k, 3);
        assert!(parsed.rerank);
    }

    #[test]
    fn test_query_options_builders() {
        let options = QueryOptions::default()
            .with_k(2)
            .with_filter("city_name", json!("Paris"))
            .without_rerank()
            .with_extra("alpha", json!(0.5));
        assert_eq!(options.k, 2);
        assert!(!options.rerank);
        assert_eq!(options.filters.unwrap()["city_name"], json!("Paris"));
        assert_eq!(options.extra["alpha"], json!(0.5));
    }

    #[test]
    fn test_degraded_response() {
        let err = RadarError::from(RagError::RetrievalFailed {
            reason: "index offline".to_string(),
        });
        let response = RagResponse::degraded("budget voirie?", &err);
        assert_eq!(response.query, "budget voirie?");
        assert!(response.answer.starts_with("Error processing query: "));
        assert!(response.answer.contains("index offline"));
        assert!(response.sources.is_empty());
        assert_eq!(response.confidence, 0.0);
        assert!(response.is_degraded());
    }

    #[test]
    fn test_query_result_serializes_document() {
        let result = QueryResult::new(
            BudgetDocument::new("Paris", 2024, "voirie", 10.0, SourceType::Pdf),
            0.75,
        )
        .with_metadata("rank", json!(1));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["document"]["city_name"], json!("Paris"));
        assert_eq!(value["score"], json!(0.75));
        assert_eq!(value["metadata"]["rank"], json!(1));
    }
}
