//! ETL loader writing documents into a vector store.

use crate::{Embedder, VectorStore};
use async_trait::async_trait;
use radar_core::{BudgetDocument, EtlError, RadarResult};
use radar_etl::Loader;
use std::sync::Arc;

/// Embeds each batch and adds it to the store.
pub struct VectorStoreLoader {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl VectorStoreLoader {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl Loader for VectorStoreLoader {
    fn name(&self) -> &str {
        "vector_store"
    }

    async fn load(&self, documents: &[BudgetDocument]) -> RadarResult<bool> {
        if documents.is_empty() {
            return Ok(true);
        }
        let embeddings = self.embedder.embed_documents(documents).await?;
        if embeddings.len() != documents.len() {
            return Err(EtlError::LoadFailed {
                reason: format!(
                    "embedder {} returned {} vectors for {} documents",
                    self.embedder.name(),
                    embeddings.len(),
                    documents.len()
                ),
            }
            .into());
        }
        tracing::debug!(
            store = %self.store.name(),
            documents = documents.len(),
            "Adding documents to vector store"
        );
        self.store.add_documents(documents, &embeddings).await
    }

    async fn health_check(&self) -> bool {
        self.store.health_check().await
    }
}

impl std::fmt::Debug for VectorStoreLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreLoader")
            .field("embedder", &self.embedder.name())
            .field("store", &self.store.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryResult;
    use radar_core::{Metadata, SourceType};
    use std::sync::Mutex;

    struct Short;

    #[async_trait]
    impl Embedder for Short {
        fn name(&self) -> &str {
            "short"
        }

        async fn embed_documents(&self, documents: &[BudgetDocument]) -> RadarResult<Vec<Vec<f32>>> {
            Ok(documents.iter().skip(1).map(|_| vec![0.5, 0.5]).collect())
        }

        async fn embed_query(&self, _text: &str) -> RadarResult<Vec<f32>> {
            Ok(vec![0.5, 0.5])
        }

        fn embedding_dimension(&self) -> usize {
            2
        }
    }

    struct Exact;

    #[async_trait]
    impl Embedder for Exact {
        fn name(&self) -> &str {
            "exact"
        }

        async fn embed_documents(&self, documents: &[BudgetDocument]) -> RadarResult<Vec<Vec<f32>>> {
            Ok(documents.iter().map(|d| vec![d.amount as f32, 1.0]).collect())
        }

        async fn embed_query(&self, _text: &str) -> RadarResult<Vec<f32>> {
            Ok(vec![0.0, 1.0])
        }

        fn embedding_dimension(&self) -> usize {
            2
        }
    }

    #[derive(Default)]
    struct Sink {
        stored: Mutex<Vec<(String, Vec<f32>)>>,
    }

    #[async_trait]
    impl VectorStore for Sink {
        fn name(&self) -> &str {
            "sink"
        }

        async fn add_documents(&self, documents: &[BudgetDocument], embeddings: &[Vec<f32>]) -> RadarResult<bool> {
            let mut stored = self.stored.lock().unwrap();
            for (doc, embedding) in documents.iter().zip(embeddings) {
                stored.push((doc.document_id(), embedding.clone()));
            }
            Ok(true)
        }

        async fn similarity_search(
            &self,
            _embedding: &[f32],
            _k: usize,
            _filters: Option<&Metadata>,
        ) -> RadarResult<Vec<QueryResult>> {
            Ok(Vec::new())
        }

        async fn hybrid_search(
            &self,
            _query: &str,
            _embedding: &[f32],
            _k: usize,
            _alpha: f64,
            _filters: Option<&Metadata>,
        ) -> RadarResult<Vec<QueryResult>> {
            Ok(Vec::new())
        }

        async fn delete_documents(&self, _document_ids: &[String]) -> RadarResult<bool> {
            Ok(true)
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn docs() -> Vec<BudgetDocument> {
        vec![
            BudgetDocument::new("Paris", 2024, "voirie", 2.0, SourceType::Csv),
            BudgetDocument::new("Lyon", 2024, "voirie", 3.0, SourceType::Csv),
        ]
    }

    #[tokio::test]
    async fn test_load_embeds_and_stores() {
        let sink = Arc::new(Sink::default());
        let loader = VectorStoreLoader::new(Arc::new(Exact), sink.clone());
        assert!(loader.load(&docs()).await.unwrap());

        let stored = sink.stored.lock().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].0, docs()[0].document_id());
        assert_eq!(stored[1].1, vec![3.0, 1.0]);
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch() {
        let loader = VectorStoreLoader::new(Arc::new(Short), Arc::new(Sink::default()));
        let err = loader.load(&docs()).await.unwrap_err();
        assert!(err.to_string().contains("returned 1 vectors for 2 documents"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let sink = Arc::new(Sink::default());
        let loader = VectorStoreLoader::new(Arc::new(Short), sink.clone());
        assert!(loader.load(&[]).await.unwrap());
        assert!(sink.stored.lock().unwrap().is_empty());
        assert!(loader.health_check().await);
    }
}
