//! Mairie Radar Core - Shared Types
//!
//! Value types, error taxonomy, configuration and health reporting shared by
//! the agent, ETL, RAG and API crates. This crate carries no I/O.

pub mod config;
pub mod document;
pub mod error;
pub mod health;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use config::{
    AgentSettings, ApiSettings, AppSettings, FeatureFlags, LlmProvider, LlmProviderConfig,
    LlmSettings, PathSettings, RadarConfig, VectorStoreConfig, VectorStoreSettings,
};
pub use document::{BudgetDocument, SourceType};
pub use error::{
    AgentError, ConfigError, EtlError, LlmError, RadarError, RadarResult, RagError,
};
pub use health::{aggregate_status, HealthCheck, HealthStatus};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Free-form JSON mapping used for message content, metadata and options.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

/// Current UTC time.
pub fn now() -> Timestamp {
    Utc::now()
}

// ============================================================================
// TESTS
// ============================================================================
