//! Mairie Radar ETL - Budget Document Pipeline
//!
//! Stage contracts for collecting, parsing, validating and loading
//! [`BudgetDocument`]s, and the [`EtlPipeline`] that runs them in order.

pub mod pipeline;
pub mod validate;

use async_trait::async_trait;
use radar_core::{BudgetDocument, Metadata, RadarResult};
use std::path::Path;

pub use pipeline::{EtlPipeline, EtlRunSummary};
pub use validate::BasicValidator;

// ============================================================================
// STAGE TRAITS
// ============================================================================

/// Pulls budget documents from a source.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &str;

    /// Collect documents. `options` is passed through from the pipeline run.
    async fn collect(&self, options: &Metadata) -> RadarResult<Vec<BudgetDocument>>;

    /// Whether the collector is configured well enough to run.
    fn validate_config(&self) -> bool;
}

/// Turns a file on disk into budget documents.
#[async_trait]
pub trait Parser: Send + Sync {
    fn name(&self) -> &str;

    async fn parse(&self, path: &Path, options: &Metadata) -> RadarResult<Vec<BudgetDocument>>;

    fn supports_format(&self, path: &Path) -> bool;
}

/// Accepts or rejects a single document.
#[async_trait]
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(false)` rejects the document; [`Validator::validation_errors`]
    /// then explains why.
    async fn validate(&self, document: &BudgetDocument) -> RadarResult<bool>;

    fn validation_errors(&self, document: &BudgetDocument) -> Vec<String>;
}

/// Writes validated documents to storage.
#[async_trait]
pub trait Loader: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `Ok(false)` when the batch was not stored.
    async fn load(&self, documents: &[BudgetDocument]) -> RadarResult<bool>;

    async fn health_check(&self) -> bool;
}
