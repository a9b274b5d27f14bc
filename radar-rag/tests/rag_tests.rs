//! RAG over the in-memory store, fed through the ETL pipeline.

use async_trait::async_trait;
use radar_core::{BudgetDocument, Metadata, RadarResult, SourceType};
use radar_etl::EtlPipeline;
use radar_llm::GenerationParams;
use radar_rag::{
    LlmGenerator, QueryOptions, QueryResult, RagPipeline, Retriever, VectorRetriever, VectorStore,
    VectorStoreLoader,
};
use radar_test_utils::assertions::assert_rag_error;
use radar_test_utils::fixtures::sample_documents;
use radar_test_utils::generators::arb_query_result;
use radar_test_utils::{
    MockChatModel, MockCollector, MockEmbedder, MockGenerator, MockRetriever, MockVectorStore,
};
use serde_json::json;
use std::sync::Arc;

async fn indexed_store(embedder: Arc<MockEmbedder>) -> Arc<MockVectorStore> {
    let store = Arc::new(MockVectorStore::new());
    let mut etl = EtlPipeline::new();
    etl.add_collector(Arc::new(MockCollector::new("fixtures", sample_documents())));
    etl.add_loader(Arc::new(VectorStoreLoader::new(embedder, store.clone())));

    let summary = etl.run(&Metadata::new()).await;
    assert!(summary.is_clean(), "{:?}", summary.errors);
    assert_eq!(summary.loaded, 4);
    store
}

#[tokio::test]
async fn test_etl_loads_into_vector_store() {
    let embedder = Arc::new(MockEmbedder::new(16));
    let store = indexed_store(embedder).await;
    assert_eq!(store.len(), 4);
    assert!(store.health_check().await);
}

#[tokio::test]
async fn test_query_with_filter_and_llm_generator() {
    let embedder = Arc::new(MockEmbedder::new(16));
    let store = indexed_store(embedder.clone()).await;
    let model = Arc::new(MockChatModel::new("Lyon consacre 4,2 M EUR à la culture."));
    let pipeline = RagPipeline::new(
        Arc::new(VectorRetriever::new(embedder, store)),
        Arc::new(LlmGenerator::new(model.clone(), GenerationParams::default())),
    );

    let options = QueryOptions::default().with_filter("city_name", json!("Lyon"));
    let response = pipeline.query("budget culture", &options).await.unwrap();

    assert_eq!(response.answer, "Lyon consacre 4,2 M EUR à la culture.");
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].document.city_name, "Lyon");
    assert!(response.confidence > 0.0 && response.confidence <= 1.0);
    assert_eq!(response.metadata["retriever"], json!("vector"));
    assert_eq!(response.metadata["generator"], json!("mock"));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("[1] Lyon 2024 - culture"));
    assert!(prompts[0].contains("Question: budget culture"));
}

#[tokio::test]
async fn test_hybrid_search_ranks_keyword_matches() {
    let embedder = Arc::new(MockEmbedder::new(16));
    let store = indexed_store(embedder.clone()).await;
    let pipeline = RagPipeline::new(
        Arc::new(VectorRetriever::new(embedder, store)),
        Arc::new(MockGenerator::new(0.7)),
    );

    let options = QueryOptions::default()
        .with_k(2)
        .with_extra("alpha", json!(0.0));
    let response = pipeline.query("voirie chaussées", &options).await.unwrap();

    let cities: Vec<_> = response
        .sources
        .iter()
        .map(|r| r.document.city_name.as_str())
        .collect();
    assert_eq!(cities, vec!["Lille", "Paris"]);
    assert!((response.sources[0].score - 1.0).abs() < 1e-9);
    assert!((response.sources[1].score - 0.5).abs() < 1e-9);
    assert_eq!(response.answer, "voirie chaussées (2 sources)");
    assert_eq!(response.confidence, 0.7);
}

#[tokio::test]
async fn test_generation_failure_degrades_in_batch() {
    let embedder = Arc::new(MockEmbedder::new(16));
    let store = indexed_store(embedder.clone()).await;
    let model = Arc::new(MockChatModel::new("Réponse").then_answer("Première réponse").then_fail(
        radar_core::LlmError::RateLimited {
            provider: "mock".to_string(),
            retry_after_ms: 500,
        },
    ));
    let pipeline = RagPipeline::new(
        Arc::new(VectorRetriever::new(embedder, store)),
        Arc::new(LlmGenerator::new(model, GenerationParams::default())),
    );

    let queries = vec![
        "voirie".to_string(),
        "culture".to_string(),
        "education".to_string(),
    ];
    let responses = pipeline.batch_query(&queries, &QueryOptions::default()).await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].answer, "Première réponse");
    assert!(responses[1].is_degraded());
    assert!(responses[1].answer.starts_with("Error processing query: RAG error: Generation failed"));
    assert!(responses[1].answer.contains("Rate limited by mock"));
    assert_eq!(responses[2].answer, "Réponse");
}

#[tokio::test]
async fn test_single_query_failure_is_an_error() {
    let pipeline = RagPipeline::new(
        Arc::new(MockRetriever::new(Vec::new()).failing_on("panne")),
        Arc::new(MockGenerator::new(0.5)),
    );
    let result = pipeline.query("panne", &QueryOptions::default()).await;
    assert_rag_error(&result);
}

#[tokio::test]
async fn test_deleted_documents_are_not_retrieved() {
    let embedder = Arc::new(MockEmbedder::new(16));
    let store = indexed_store(embedder.clone()).await;
    let lyon = sample_documents()[1].document_id();
    assert!(store.delete_documents(&[lyon]).await.unwrap());
    assert!(!store.delete_documents(&["missing".to_string()]).await.unwrap());

    let retriever = VectorRetriever::new(embedder, store);
    let results = retriever
        .retrieve("culture", 10, None, &Metadata::new())
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.document.city_name != "Lyon"));
}

/// Returns every chunk it holds regardless of `k`; reranking reverses them.
struct ReversingRetriever {
    chunks: Vec<QueryResult>,
}

#[async_trait]
impl Retriever for ReversingRetriever {
    fn name(&self) -> &str {
        "reversing"
    }

    async fn retrieve(
        &self,
        _query: &str,
        _k: usize,
        _filters: Option<&Metadata>,
        _extra: &Metadata,
    ) -> RadarResult<Vec<QueryResult>> {
        Ok(self.chunks.clone())
    }

    async fn rerank(&self, _query: &str, mut results: Vec<QueryResult>) -> RadarResult<Vec<QueryResult>> {
        results.reverse();
        Ok(results)
    }
}

#[tokio::test]
async fn test_rerank_keeps_every_retrieved_source() {
    let chunks = (0..5)
        .map(|i| {
            let doc = BudgetDocument::new("Paris", 2023, "voirie", 1_000.0 * i as f64, SourceType::Pdf)
                .with_text(format!("C{}", i));
            QueryResult::new(doc, 1.0 - 0.1 * i as f64)
        })
        .collect();
    let pipeline = RagPipeline::new(
        Arc::new(ReversingRetriever { chunks }),
        Arc::new(MockGenerator::new(0.7)),
    );

    let options = QueryOptions::default().with_k(3);
    assert!(options.rerank);
    let response = pipeline
        .query("What is the 2023 budget for roads?", &options)
        .await
        .unwrap();

    let texts: Vec<&str> = response
        .sources
        .iter()
        .map(|s| s.document.extracted_text.as_str())
        .collect();
    assert_eq!(texts, vec!["C4", "C3", "C2", "C1", "C0"]);
    assert_eq!(response.answer, "What is the 2023 budget for roads? (5 sources)");
}

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Reranked sources come back in non-increasing score order, whatever
        /// order the retriever produced.
        #[test]
        fn prop_vector_rerank_orders_by_score(
            results in prop::collection::vec(arb_query_result(), 0..10)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let retriever = VectorRetriever::new(
                Arc::new(MockEmbedder::new(4)),
                Arc::new(MockVectorStore::new()),
            );
            let ranked = rt.block_on(retriever.rerank("q", results.clone())).unwrap();
            prop_assert_eq!(ranked.len(), results.len());
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }

        /// A batch always yields one response per query, in order.
        #[test]
        fn prop_batch_preserves_order(
            queries in prop::collection::vec("[a-z]{1,8}", 0..8)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let pipeline = RagPipeline::new(
                Arc::new(MockRetriever::new(Vec::new()).failing_on("boom")),
                Arc::new(MockGenerator::new(0.5)),
            );
            let responses = rt.block_on(pipeline.batch_query(&queries, &QueryOptions::default()));
            let got: Vec<String> = responses.iter().map(|r| r.query.clone()).collect();
            prop_assert_eq!(got, queries);
        }
    }
}
