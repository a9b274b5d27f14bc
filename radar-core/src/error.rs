//! Error types for Mairie Radar operations

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Provider not supported: {provider}")]
    ProviderNotSupported { provider: String },
}

/// LLM provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No LLM provider configured")]
    ProviderNotConfigured,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: i64,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Embedding failed: {reason}")]
    EmbeddingFailed { reason: String },
}

/// Agent layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("Agent not registered: {agent_id}")]
    NotRegistered { agent_id: String },

    #[error("No agent found with capability: {capability}")]
    NoCapableAgent { capability: String },

    #[error("Agent {agent_id} has no task executor attached")]
    NoExecutor { agent_id: String },

    #[error("Unknown recipient: {agent_id}")]
    UnknownRecipient { agent_id: String },

    #[error("Mailbox closed for agent {agent_id}")]
    MailboxClosed { agent_id: String },

    #[error("Invalid message: {reason}")]
    InvalidMessage { reason: String },

    #[error("Task {task_id} failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    #[error("Task {task_id} timed out after {timeout_ms}ms")]
    TaskTimeout { task_id: String, timeout_ms: u64 },

    #[error("Agent {agent_id} is not initialized")]
    NotInitialized { agent_id: String },

    #[error("Handler panicked in agent {agent_id}: {reason}")]
    HandlerPanicked { agent_id: String, reason: String },
}

/// ETL stage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EtlError {
    #[error("Collection failed: {reason}")]
    CollectionFailed { reason: String },

    #[error("Parsing failed for {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Unsupported format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Loading failed: {reason}")]
    LoadFailed { reason: String },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Retrieval and generation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RagError {
    #[error("Retrieval failed: {reason}")]
    RetrievalFailed { reason: String },

    #[error("Rerank failed: {reason}")]
    RerankFailed { reason: String },

    #[error("Generation failed: {reason}")]
    GenerationFailed { reason: String },

    #[error("Vector store error: {reason}")]
    VectorStore { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Master error type for all Mairie Radar errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RadarError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("ETL error: {0}")]
    Etl(#[from] EtlError),

    #[error("RAG error: {0}")]
    Rag(#[from] RagError),
}

/// Result type alias for Mairie Radar operations.
pub type RadarResult<T> = Result<T, RadarError>;

// =============================================================================
// TESTS
// =============================================================================
