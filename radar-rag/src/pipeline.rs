//! Retrieve, rerank, generate.

use crate::{Generator, QueryOptions, RagResponse, Retriever};
use radar_core::{Metadata, RadarResult, RagError};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Answers queries with one retriever and one generator.
pub struct RagPipeline {
    name: String,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
}

impl RagPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn Generator>) -> Self {
        Self {
            name: "default".to_string(),
            retriever,
            generator,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Answer one query. Any component failure is returned to the caller.
    ///
    /// Results are reranked only when reranking is requested and more than
    /// one document came back.
    pub async fn query(&self, query: &str, options: &QueryOptions) -> RadarResult<RagResponse> {
        let span = tracing::info_span!("rag.query", pipeline = %self.name, k = options.k);
        async move {
            tracing::info!(query = %query, "Processing query");
            let response = self.answer(query, options).await;
            match &response {
                Ok(r) => tracing::info!(
                    sources = r.sources.len(),
                    confidence = r.confidence,
                    "Generated response"
                ),
                Err(err) => tracing::error!(error = %err, "RAG pipeline failed"),
            }
            response
        }
        .instrument(span)
        .await
    }

    async fn answer(&self, query: &str, options: &QueryOptions) -> RadarResult<RagResponse> {
        let mut sources = self
            .retriever
            .retrieve(query, options.k, options.filters.as_ref(), &options.extra)
            .await?;
        tracing::info!(documents = sources.len(), "Retrieved documents");

        if options.rerank && sources.len() > 1 {
            sources = self.retriever.rerank(query, sources).await?;
            tracing::debug!("Re-ranked retrieved documents");
        }

        let answer = self.generator.generate(query, &sources, &options.extra).await?;
        let confidence = self
            .generator
            .estimate_confidence(query, &answer, &sources)
            .await?;

        let mut metadata = Metadata::new();
        metadata.insert("retriever".to_string(), json!(self.retriever.name()));
        metadata.insert("generator".to_string(), json!(self.generator.name()));
        metadata.insert("k".to_string(), json!(options.k));
        metadata.insert("rerank".to_string(), json!(options.rerank));

        Ok(RagResponse {
            query: query.to_string(),
            answer,
            sources,
            confidence,
            metadata,
        })
    }

    /// Answer every query, in order.
    ///
    /// A failed query yields a degraded response in its slot instead of an
    /// error, so the output always has one entry per input.
    pub async fn batch_query(&self, queries: &[String], options: &QueryOptions) -> Vec<RagResponse> {
        self.batch_query_with_cancel(queries, options, &CancellationToken::new())
            .await
    }

    /// Like [`RagPipeline::batch_query`], but queries not yet started when
    /// `cancel` fires get a degraded "cancelled" response.
    pub async fn batch_query_with_cancel(
        &self,
        queries: &[String],
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Vec<RagResponse> {
        let mut responses = Vec::with_capacity(queries.len());
        for query in queries {
            if cancel.is_cancelled() {
                let err = radar_core::RadarError::from(RagError::Cancelled);
                let mut response = RagResponse::degraded(query.as_str(), &err);
                response.metadata.insert("cancelled".to_string(), json!(true));
                responses.push(response);
                continue;
            }
            match self.query(query, options).await {
                Ok(response) => responses.push(response),
                Err(err) => {
                    tracing::error!(query = %query, error = %err, "Failed to process query");
                    responses.push(RagResponse::degraded(query.as_str(), &err));
                }
            }
        }
        responses
    }
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("name", &self.name)
            .field("retriever", &self.retriever.name())
            .field("generator", &self.generator.name())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryResult;
    use async_trait::async_trait;
    use radar_core::{BudgetDocument, RadarError, SourceType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn result(city: &str, score: f64) -> QueryResult {
        QueryResult::new(
            BudgetDocument::new(city, 2024, "voirie", 100.0, SourceType::Csv),
            score,
        )
    }

    /// Returns canned results; reranking reverses them.
    struct Canned {
        results: Vec<QueryResult>,
        fail_on: Option<String>,
        reranks: AtomicUsize,
        seen_k: Mutex<Vec<usize>>,
    }

    impl Canned {
        fn new(results: Vec<QueryResult>) -> Arc<Self> {
            Arc::new(Self {
                results,
                fail_on: None,
                reranks: AtomicUsize::new(0),
                seen_k: Mutex::new(Vec::new()),
            })
        }

        fn failing_on(query: &str) -> Arc<Self> {
            Arc::new(Self {
                results: vec![result("Paris", 0.5)],
                fail_on: Some(query.to_string()),
                reranks: AtomicUsize::new(0),
                seen_k: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Retriever for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn retrieve(
            &self,
            query: &str,
            k: usize,
            _filters: Option<&Metadata>,
            _extra: &Metadata,
        ) -> RadarResult<Vec<QueryResult>> {
            self.seen_k.lock().unwrap().push(k);
            if self.fail_on.as_deref() == Some(query) {
                return Err(RagError::RetrievalFailed {
                    reason: "index offline".to_string(),
                }
                .into());
            }
            Ok(self.results.iter().take(k).cloned().collect())
        }

        async fn rerank(&self, _query: &str, mut results: Vec<QueryResult>) -> RadarResult<Vec<QueryResult>> {
            self.reranks.fetch_add(1, Ordering::SeqCst);
            results.reverse();
            Ok(results)
        }
    }

    /// Echoes the cities it was given.
    struct Echo;

    #[async_trait]
    impl Generator for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, query: &str, context: &[QueryResult], _extra: &Metadata) -> RadarResult<String> {
            let cities: Vec<_> = context.iter().map(|r| r.document.city_name.as_str()).collect();
            Ok(format!("{} -> {}", query, cities.join(",")))
        }

        fn prompt_template(&self) -> &str {
            "{query}"
        }

        async fn estimate_confidence(&self, _query: &str, _answer: &str, context: &[QueryResult]) -> RadarResult<f64> {
            Ok(if context.is_empty() { 0.0 } else { 0.8 })
        }
    }

    #[tokio::test]
    async fn test_query_reranks_and_records_metadata() {
        let retriever = Canned::new(vec![result("Paris", 0.9), result("Lyon", 0.4)]);
        let pipeline = RagPipeline::new(retriever.clone(), Arc::new(Echo));

        let response = pipeline.query("voirie", &QueryOptions::default()).await.unwrap();
        assert_eq!(response.answer, "voirie -> Lyon,Paris");
        assert_eq!(response.sources[0].document.city_name, "Lyon");
        assert_eq!(response.confidence, 0.8);
        assert_eq!(response.metadata["retriever"], json!("canned"));
        assert_eq!(response.metadata["generator"], json!("echo"));
        assert_eq!(response.metadata["k"], json!(5));
        assert_eq!(response.metadata["rerank"], json!(true));
        assert_eq!(retriever.reranks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_result_is_not_reranked() {
        let retriever = Canned::new(vec![result("Paris", 0.9), result("Lyon", 0.4)]);
        let pipeline = RagPipeline::new(retriever.clone(), Arc::new(Echo));
        let response = pipeline
            .query("voirie", &QueryOptions::default().with_k(1))
            .await
            .unwrap();
        assert_eq!(response.sources.len(), 1);
        assert_eq!(retriever.reranks.load(Ordering::SeqCst), 0);
        assert_eq!(*retriever.seen_k.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_rerank_disabled_keeps_retrieval_order() {
        let retriever = Canned::new(vec![result("Paris", 0.9), result("Lyon", 0.4)]);
        let pipeline = RagPipeline::new(retriever.clone(), Arc::new(Echo));
        let response = pipeline
            .query("voirie", &QueryOptions::default().without_rerank())
            .await
            .unwrap();
        assert_eq!(response.answer, "voirie -> Paris,Lyon");
        assert_eq!(response.metadata["rerank"], json!(false));
        assert_eq!(retriever.reranks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_results_still_generates() {
        let pipeline = RagPipeline::new(Canned::new(vec![]), Arc::new(Echo));
        let response = pipeline.query("voirie", &QueryOptions::default()).await.unwrap();
        assert!(response.sources.is_empty());
        assert_eq!(response.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_query_propagates_errors() {
        let pipeline = RagPipeline::new(Canned::failing_on("boom"), Arc::new(Echo));
        let err = pipeline.query("boom", &QueryOptions::default()).await.unwrap_err();
        assert!(matches!(err, RadarError::Rag(RagError::RetrievalFailed { .. })));
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let pipeline = RagPipeline::new(Canned::failing_on("boom"), Arc::new(Echo));
        let queries = vec!["a".to_string(), "boom".to_string(), "c".to_string()];
        let responses = pipeline.batch_query(&queries, &QueryOptions::default()).await;

        assert_eq!(responses.len(), 3);
        let order: Vec<_> = responses.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(order, vec!["a", "boom", "c"]);
        assert!(!responses[0].is_degraded());
        assert!(responses[1].is_degraded());
        assert!(responses[1].answer.contains("index offline"));
        assert_eq!(responses[1].confidence, 0.0);
        assert!(responses[1].sources.is_empty());
        assert!(!responses[2].is_degraded());
    }

    #[tokio::test]
    async fn test_batch_after_cancel() {
        let retriever = Canned::new(vec![result("Paris", 0.9)]);
        let pipeline = RagPipeline::new(retriever.clone(), Arc::new(Echo));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let queries = vec!["a".to_string(), "b".to_string()];
        let responses = pipeline
            .batch_query_with_cancel(&queries, &QueryOptions::default(), &cancel)
            .await;
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r.metadata["cancelled"] == json!(true)));
        assert!(retriever.seen_k.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pipeline = RagPipeline::new(Canned::new(vec![]), Arc::new(Echo));
        assert!(pipeline.batch_query(&[], &QueryOptions::default()).await.is_empty());
    }
}
