//! Retrieval over an embedder and a vector store.

use crate::{Embedder, QueryResult, Retriever, VectorStore};
use async_trait::async_trait;
use radar_core::{Metadata, RadarResult, RagError};
use serde_json::Value;
use std::sync::Arc;

/// Embeds the query and searches the store with it.
///
/// Setting `alpha` in the query's extra options switches to hybrid search
/// with that weight.
pub struct VectorRetriever {
    name: String,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            name: "vector".to_string(),
            embedder,
            store,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        filters: Option<&Metadata>,
        extra: &Metadata,
    ) -> RadarResult<Vec<QueryResult>> {
        let embedding = self.embedder.embed_query(query).await?;
        let expected = self.embedder.embedding_dimension();
        if embedding.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                got: embedding.len(),
            }
            .into());
        }

        match extra.get("alpha").and_then(Value::as_f64) {
            Some(alpha) => {
                tracing::debug!(store = %self.store.name(), alpha, "Hybrid search");
                self.store
                    .hybrid_search(query, &embedding, k, alpha.clamp(0.0, 1.0), filters)
                    .await
            }
            None => self.store.similarity_search(&embedding, k, filters).await,
        }
    }

    /// Stable sort by descending score; ties keep retrieval order.
    async fn rerank(&self, _query: &str, mut results: Vec<QueryResult>) -> RadarResult<Vec<QueryResult>> {
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(results)
    }
}

impl std::fmt::Debug for VectorRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorRetriever")
            .field("name", &self.name)
            .field("embedder", &self.embedder.name())
            .field("store", &self.store.name())
            .finish()
    }
}
