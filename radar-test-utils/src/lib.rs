//! Mairie Radar Test Utilities
//!
//! Centralized test infrastructure for the Mairie Radar workspace:
//! - Proptest generators for the shared value types
//! - Mock chat models, agents and pipeline stages
//! - Test fixtures for common scenarios
//! - Custom assertions for Radar-specific validation

// Re-export core types for convenience
pub use radar_core::{
    AgentError, AgentSettings, BudgetDocument, ConfigError, EtlError, LlmError, Metadata,
    RadarConfig, RadarError, RadarResult, RagError, SourceType,
};

use async_trait::async_trait;
use radar_agents::{Agent, AgentCapability, AgentCore, Message, MessageType, Task, TaskResult};
use radar_etl::{Collector, Loader, Validator};
use radar_llm::{ChatModel, GenerationParams};
use radar_rag::{Embedder, Generator, QueryResult, Retriever, VectorStore};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ============================================================================
// MOCK CHAT MODEL
// ============================================================================

/// Chat model returning scripted answers.
///
/// Queued answers are served first, then the default answer. Every prompt is
/// recorded.
#[derive(Debug)]
pub struct MockChatModel {
    default_answer: Result<String, LlmError>,
    queue: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockChatModel {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            default_answer: Ok(answer.into()),
            queue: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model whose every call fails with a 503.
    pub fn failing() -> Self {
        Self {
            default_answer: Err(LlmError::RequestFailed {
                provider: "mock".to_string(),
                status: 503,
                message: "service unavailable".to_string(),
            }),
            queue: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn then_answer(self, answer: impl Into<String>) -> Self {
        lock(&self.queue).push_back(Ok(answer.into()));
        self
    }

    pub fn then_fail(self, error: LlmError) -> Self {
        lock(&self.queue).push_back(Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &str, _params: &GenerationParams) -> RadarResult<String> {
        lock(&self.prompts).push(prompt.to_string());
        let next = lock(&self.queue).pop_front();
        next.unwrap_or_else(|| self.default_answer.clone())
            .map_err(Into::into)
    }
}

// ============================================================================
// MOCK AGENT
// ============================================================================

/// How a [`MockAgent`] answers tasks.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Succeed with `{"agent": id, "task": task_id}`
    Succeed,
    /// Fail with the given error
    Fail(String),
    /// Sleep before succeeding
    Delay(Duration),
}

/// Agent with fixed capabilities that records every task and message.
pub struct MockAgent {
    core: AgentCore,
    behavior: MockBehavior,
    executed: Mutex<Vec<String>>,
    messages: Mutex<Vec<Message>>,
}

impl MockAgent {
    pub fn new(agent_id: &str, capabilities: &[&str]) -> Self {
        Self::with_behavior(agent_id, capabilities, MockBehavior::Succeed)
    }

    pub fn with_behavior(agent_id: &str, capabilities: &[&str], behavior: MockBehavior) -> Self {
        let core = AgentCore::new(agent_id, format!("Mock {}", agent_id));
        for name in capabilities {
            core.add_capability(AgentCapability::new(*name, format!("mock {}", name)));
        }
        Self {
            core,
            behavior,
            executed: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Task ids in execution order.
    pub fn executed(&self) -> Vec<String> {
        lock(&self.executed).clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.messages).clone()
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn initialize(&self) -> bool {
        true
    }

    /// Echoes the content back as a response.
    async fn process_message(&self, message: Message) -> Option<Message> {
        lock(&self.messages).push(message.clone());
        Some(message.reply(self.id(), MessageType::Response, message.content.clone()))
    }

    async fn execute_task(&self, task: Task) -> TaskResult {
        lock(&self.executed).push(task.id.clone());
        match &self.behavior {
            MockBehavior::Succeed => {}
            MockBehavior::Fail(error) => return TaskResult::failure(task.id, self.id(), error.clone()),
            MockBehavior::Delay(delay) => tokio::time::sleep(*delay).await,
        }
        let result = json!({"agent": self.id(), "task": task.id});
        TaskResult::success(task.id, self.id(), result)
    }
}

// ============================================================================
// MOCK ETL STAGES
// ============================================================================

/// Collector returning a fixed batch, or failing.
#[derive(Debug)]
pub struct MockCollector {
    name: String,
    documents: Vec<BudgetDocument>,
    error: Option<String>,
    calls: AtomicUsize,
}

impl MockCollector {
    pub fn new(name: &str, documents: Vec<BudgetDocument>) -> Self {
        Self {
            name: name.to_string(),
            documents,
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            documents: Vec::new(),
            error: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collector for MockCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self, _options: &Metadata) -> RadarResult<Vec<BudgetDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(reason) => Err(EtlError::CollectionFailed {
                reason: reason.clone(),
            }
            .into()),
            None => Ok(self.documents.clone()),
        }
    }

    fn validate_config(&self) -> bool {
        self.error.is_none()
    }
}

/// Validator rejecting documents from a set of cities.
#[derive(Debug)]
pub struct MockValidator {
    name: String,
    rejected_cities: Vec<String>,
    seen: Mutex<Vec<String>>,
}

impl MockValidator {
    pub fn accept_all(name: &str) -> Self {
        Self::rejecting(name, &[])
    }

    pub fn rejecting(name: &str, cities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            rejected_cities: cities.iter().map(|c| c.to_string()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Cities of the documents this validator was asked about.
    pub fn seen(&self) -> Vec<String> {
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl Validator for MockValidator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self, document: &BudgetDocument) -> RadarResult<bool> {
        lock(&self.seen).push(document.city_name.clone());
        Ok(!self.rejected_cities.contains(&document.city_name))
    }

    fn validation_errors(&self, document: &BudgetDocument) -> Vec<String> {
        vec![format!("{} rejected {}", self.name, document.city_name)]
    }
}

/// Loader recording each batch it receives.
#[derive(Debug)]
pub struct MockLoader {
    name: String,
    outcome: Result<bool, String>,
    batches: Mutex<Vec<Vec<BudgetDocument>>>,
}

impl MockLoader {
    pub fn new(name: &str) -> Self {
        Self::with_outcome(name, Ok(true))
    }

    pub fn with_outcome(name: &str, outcome: Result<bool, String>) -> Self {
        Self {
            name: name.to_string(),
            outcome,
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batches(&self) -> Vec<Vec<BudgetDocument>> {
        lock(&self.batches).clone()
    }
}

#[async_trait]
impl Loader for MockLoader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, documents: &[BudgetDocument]) -> RadarResult<bool> {
        lock(&self.batches).push(documents.to_vec());
        self.outcome
            .clone()
            .map_err(|reason| EtlError::LoadFailed { reason }.into())
    }

    async fn health_check(&self) -> bool {
        matches!(self.outcome, Ok(true))
    }
}

// ============================================================================
// MOCK RAG COMPONENTS
// ============================================================================

/// Deterministic bag-of-bytes embedder, normalized to unit length.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut data = vec![0.0f32; self.dimensions];

        for (i, byte) in text.to_lowercase().bytes().enumerate() {
            data[i % self.dimensions] += (byte as f32) / 255.0;
        }

        let norm: f32 = data.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut data {
                *x /= norm;
            }
        }

        data
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn embed_documents(&self, documents: &[BudgetDocument]) -> RadarResult<Vec<Vec<f32>>> {
        Ok(documents
            .iter()
            .map(|d| self.embed_text(&d.embedding_text()))
            .collect())
    }

    async fn embed_query(&self, text: &str) -> RadarResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimensions
    }
}

/// In-memory vector store with cosine similarity.
///
/// Filters match top-level document fields or document metadata by
/// equality. Hybrid search blends cosine similarity with the share of query
/// words found in the document text.
#[derive(Debug)]
pub struct MockVectorStore {
    entries: Mutex<Vec<(String, BudgetDocument, Vec<f32>)>>,
    healthy: bool,
}

impl MockVectorStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            healthy: true,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            healthy: false,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matches(document: &BudgetDocument, filters: Option<&Metadata>) -> bool {
        let Some(filters) = filters else {
            return true;
        };
        let fields = serde_json::to_value(document).unwrap_or(Value::Null);
        filters.iter().all(|(key, expected)| {
            fields.get(key) == Some(expected) || document.metadata.get(key) == Some(expected)
        })
    }

    fn keyword_score(query: &str, document: &BudgetDocument) -> f64 {
        let text = document.embedding_text().to_lowercase();
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            return 0.0;
        }
        words.iter().filter(|w| text.contains(w.as_str())).count() as f64 / words.len() as f64
    }

    fn search(&self, k: usize, filters: Option<&Metadata>, score: impl Fn(&BudgetDocument, &[f32]) -> f64) -> Vec<QueryResult> {
        let mut results: Vec<QueryResult> = lock(&self.entries)
            .iter()
            .filter(|(_, doc, _)| Self::matches(doc, filters))
            .map(|(id, doc, embedding)| {
                QueryResult::new(doc.clone(), score(doc, embedding)).with_metadata("id", json!(id))
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);
        results
    }
}

impl Default for MockVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine similarity; zero when either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    f64::from(dot / (norm_a * norm_b))
}

#[async_trait]
impl VectorStore for MockVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn add_documents(&self, documents: &[BudgetDocument], embeddings: &[Vec<f32>]) -> RadarResult<bool> {
        if documents.len() != embeddings.len() {
            return Err(RagError::VectorStore {
                reason: format!("{} documents but {} embeddings", documents.len(), embeddings.len()),
            }
            .into());
        }
        let mut entries = lock(&self.entries);
        for (document, embedding) in documents.iter().zip(embeddings) {
            let id = document.document_id();
            entries.retain(|(existing, _, _)| existing != &id);
            entries.push((id, document.clone(), embedding.clone()));
        }
        Ok(true)
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        filters: Option<&Metadata>,
    ) -> RadarResult<Vec<QueryResult>> {
        Ok(self.search(k, filters, |_, stored| cosine_similarity(embedding, stored)))
    }

    async fn hybrid_search(
        &self,
        query: &str,
        embedding: &[f32],
        k: usize,
        alpha: f64,
        filters: Option<&Metadata>,
    ) -> RadarResult<Vec<QueryResult>> {
        Ok(self.search(k, filters, |doc, stored| {
            alpha * cosine_similarity(embedding, stored) + (1.0 - alpha) * Self::keyword_score(query, doc)
        }))
    }

    async fn delete_documents(&self, document_ids: &[String]) -> RadarResult<bool> {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|(id, _, _)| !document_ids.contains(id));
        Ok(entries.len() < before)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

/// Retriever returning fixed results; fails for one chosen query.
#[derive(Debug)]
pub struct MockRetriever {
    results: Vec<QueryResult>,
    fail_on: Option<String>,
    reranks: AtomicUsize,
}

impl MockRetriever {
    pub fn new(results: Vec<QueryResult>) -> Self {
        Self {
            results,
            fail_on: None,
            reranks: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.fail_on = Some(query.to_string());
        self
    }

    pub fn rerank_count(&self) -> usize {
        self.reranks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    fn name(&self) -> &str {
        "mock"
    }

    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        _filters: Option<&Metadata>,
        _extra: &Metadata,
    ) -> RadarResult<Vec<QueryResult>> {
        if self.fail_on.as_deref() == Some(query) {
            return Err(RagError::RetrievalFailed {
                reason: format!("no index for '{}'", query),
            }
            .into());
        }
        Ok(self.results.iter().take(k).cloned().collect())
    }

    /// Reverses the order so tests can observe reranking.
    async fn rerank(&self, _query: &str, mut results: Vec<QueryResult>) -> RadarResult<Vec<QueryResult>> {
        self.reranks.fetch_add(1, Ordering::SeqCst);
        results.reverse();
        Ok(results)
    }
}

/// Generator answering "<query> (<n> sources)" with a fixed confidence.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    confidence: f64,
}

impl MockGenerator {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, query: &str, context: &[QueryResult], _extra: &Metadata) -> RadarResult<String> {
        Ok(format!("{} ({} sources)", query, context.len()))
    }

    fn prompt_template(&self) -> &str {
        "{query}"
    }

    async fn estimate_confidence(&self, _query: &str, _answer: &str, _context: &[QueryResult]) -> RadarResult<f64> {
        Ok(self.confidence)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for the shared value types.

    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use radar_agents::AgentStatus;

    pub fn arb_source_type() -> impl Strategy<Value = SourceType> {
        prop_oneof![
            Just(SourceType::Pdf),
            Just(SourceType::Csv),
            Just(SourceType::Json),
            Just(SourceType::Web),
        ]
    }

    pub fn arb_message_type() -> impl Strategy<Value = MessageType> {
        prop_oneof![
            Just(MessageType::Request),
            Just(MessageType::Response),
            Just(MessageType::Notification),
            Just(MessageType::Error),
            Just(MessageType::Heartbeat),
        ]
    }

    pub fn arb_agent_status() -> impl Strategy<Value = AgentStatus> {
        prop_oneof![
            Just(AgentStatus::Idle),
            Just(AgentStatus::Busy),
            Just(AgentStatus::Error),
            Just(AgentStatus::Offline),
        ]
    }

    pub fn arb_city() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Paris".to_string()),
            Just("Lyon".to_string()),
            Just("Marseille".to_string()),
            Just("Toulouse".to_string()),
            "[A-Z][a-z]{2,12}",
        ]
    }

    pub fn arb_collection_date() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2030, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
    }

    /// Small flat metadata map with JSON-safe values.
    pub fn arb_metadata() -> impl Strategy<Value = Metadata> {
        prop::collection::vec(
            (
                "[a-z_]{1,10}",
                prop_oneof![
                    any::<i32>().prop_map(|n| json!(n)),
                    any::<bool>().prop_map(|b| json!(b)),
                    "[a-zA-Z0-9 ]{0,20}".prop_map(|s| json!(s)),
                ],
            ),
            0..4,
        )
        .prop_map(|pairs| pairs.into_iter().collect())
    }

    pub fn arb_budget_document() -> impl Strategy<Value = BudgetDocument> {
        (
            arb_city(),
            1990i32..2035,
            "[a-z]{3,12}",
            0.0f64..1.0e9,
            arb_source_type(),
            "[a-zA-Z0-9 ]{0,60}",
            arb_metadata(),
            arb_collection_date(),
        )
            .prop_map(|(city, year, category, amount, source_type, text, metadata, date)| {
                let mut doc = BudgetDocument::new(city, year, category, amount, source_type)
                    .with_url(format!("https://data.example.fr/{}/{}.{}", year, source_type, source_type))
                    .with_text(text)
                    .with_collection_date(date);
                doc.metadata = metadata;
                doc
            })
    }

    pub fn arb_agent_capability() -> impl Strategy<Value = AgentCapability> {
        ("[a-z_]{3,16}", "[a-zA-Z ]{0,40}").prop_map(|(name, description)| {
            AgentCapability::new(name, description).with_input("input", "string")
        })
    }

    pub fn arb_message() -> impl Strategy<Value = Message> {
        ("[a-z_]{1,12}", "[a-z_]{1,12}", arb_message_type(), arb_metadata())
            .prop_map(|(sender, receiver, message_type, content)| {
                Message::new(sender, receiver, message_type, content)
            })
    }

    pub fn arb_task() -> impl Strategy<Value = Task> {
        (
            "[a-z0-9-]{1,12}",
            prop::option::of("[a-z_]{3,12}"),
            "[a-z_]{3,12}",
        )
            .prop_map(|(id, kind, capability)| {
                let task = Task::new(id).with_capability(capability);
                match kind {
                    Some(kind) => task.with_kind(kind),
                    None => task,
                }
            })
    }

    pub fn arb_task_result() -> impl Strategy<Value = TaskResult> {
        (
            "[a-z0-9-]{1,12}",
            "[a-z_]{1,12}",
            any::<bool>(),
            "[a-zA-Z ]{1,30}",
            0u64..100_000,
        )
            .prop_map(|(task_id, agent_id, success, text, ms)| {
                let result = if success {
                    TaskResult::success(task_id, agent_id, json!({"output": text}))
                } else {
                    TaskResult::failure(task_id, agent_id, text)
                };
                result.with_execution_time(Duration::from_millis(ms))
            })
    }

    pub fn arb_query_result() -> impl Strategy<Value = QueryResult> {
        (arb_budget_document(), 0.0f64..1.0).prop_map(|(doc, score)| QueryResult::new(doc, score))
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::NaiveDate;

    /// A realistic road-works budget line for Paris.
    pub fn sample_document() -> BudgetDocument {
        BudgetDocument::new("Paris", 2024, "voirie", 12_500_000.0, SourceType::Pdf)
            .with_url("https://opendata.paris.fr/budget-2024.pdf")
            .with_text("Budget primitif 2024 - voirie et déplacements: 12,5 M EUR")
            .with_collection_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default())
    }

    /// A handful of documents across cities and categories.
    pub fn sample_documents() -> Vec<BudgetDocument> {
        vec![
            sample_document(),
            BudgetDocument::new("Lyon", 2024, "culture", 4_200_000.0, SourceType::Csv)
                .with_text("Lyon culture 2024: musées et bibliothèques"),
            BudgetDocument::new("Marseille", 2023, "education", 8_750_000.0, SourceType::Json)
                .with_text("Marseille écoles 2023: rénovation des bâtiments scolaires"),
            BudgetDocument::new("Lille", 2024, "voirie", 3_100_000.0, SourceType::Web)
                .with_text("Lille voirie 2024: entretien des chaussées"),
        ]
    }

    /// Agent settings with timeouts short enough for tests.
    pub fn fast_agent_settings() -> AgentSettings {
        AgentSettings {
            receive_timeout_ms: 10,
            error_backoff_ms: 10,
            task_timeout_ms: 500,
            mailbox_capacity: 16,
        }
    }

    /// Configuration built from an explicit set of variables only.
    pub fn config_from(vars: &[(&str, &str)]) -> RadarConfig {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RadarConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }

    /// Development configuration with a Google key set.
    pub fn test_config() -> RadarConfig {
        config_from(&[("GOOGLE_API_KEY", "test-key"), ("ENVIRONMENT", "test")])
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for Radar-specific validation.

    use super::*;

    /// Assert that a RadarResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &RadarResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a RadarResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &RadarResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert that a RadarResult is an agent error.
    #[track_caller]
    pub fn assert_agent_error<T: std::fmt::Debug>(result: &RadarResult<T>) {
        match result {
            Err(RadarError::Agent(_)) => {}
            other => panic!("Expected Agent error, got: {:?}", other),
        }
    }

    /// Assert that a RadarResult is an ETL error.
    #[track_caller]
    pub fn assert_etl_error<T: std::fmt::Debug>(result: &RadarResult<T>) {
        match result {
            Err(RadarError::Etl(_)) => {}
            other => panic!("Expected ETL error, got: {:?}", other),
        }
    }

    /// Assert that a RadarResult is a RAG error.
    #[track_caller]
    pub fn assert_rag_error<T: std::fmt::Debug>(result: &RadarResult<T>) {
        match result {
            Err(RadarError::Rag(_)) => {}
            other => panic!("Expected RAG error, got: {:?}", other),
        }
    }

    /// Assert that a task result reports failure mentioning `needle`.
    #[track_caller]
    pub fn assert_task_failed(result: &TaskResult, needle: &str) {
        assert!(!result.is_success(), "Expected failed task, got: {:?}", result);
        let error = result.error().unwrap_or_default();
        assert!(
            error.contains(needle),
            "Expected task error containing {:?}, got {:?}",
            needle,
            error
        );
    }
}
