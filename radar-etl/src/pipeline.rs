//! Ordered collect / validate / load runs.

use crate::{Collector, Loader, Parser, Validator};
use radar_core::{
    BudgetDocument, EtlError, HealthCheck, Metadata, RadarError, RadarResult,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Outcome of one pipeline run.
///
/// Counts are cumulative across stages; `loaded` adds the validated count
/// once per successful loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlRunSummary {
    pub collected: usize,
    pub validated: usize,
    pub loaded: usize,
    pub errors: Vec<String>,
    #[serde(default)]
    pub cancelled: bool,
}

impl EtlRunSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }
}

/// Runs registered stages in registration order.
///
/// Stage failures are recorded in the summary and never stop the run; parsers
/// are only used by [`EtlPipeline::parse_document`].
#[derive(Default)]
pub struct EtlPipeline {
    collectors: Vec<Arc<dyn Collector>>,
    parsers: Vec<Arc<dyn Parser>>,
    validators: Vec<Arc<dyn Validator>>,
    loaders: Vec<Arc<dyn Loader>>,
}

impl EtlPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_collector(&mut self, collector: Arc<dyn Collector>) {
        tracing::info!(collector = %collector.name(), "Added collector");
        self.collectors.push(collector);
    }

    pub fn add_parser(&mut self, parser: Arc<dyn Parser>) {
        tracing::info!(parser = %parser.name(), "Added parser");
        self.parsers.push(parser);
    }

    pub fn add_validator(&mut self, validator: Arc<dyn Validator>) {
        tracing::info!(validator = %validator.name(), "Added validator");
        self.validators.push(validator);
    }

    pub fn add_loader(&mut self, loader: Arc<dyn Loader>) {
        tracing::info!(loader = %loader.name(), "Added loader");
        self.loaders.push(loader);
    }

    pub async fn run(&self, options: &Metadata) -> EtlRunSummary {
        self.run_with_cancel(options, &CancellationToken::new()).await
    }

    /// Run the pipeline, checking `cancel` between units of work.
    ///
    /// A cancelled run stops before the next collector, document or loader and
    /// returns the counts reached so far with `cancelled` set.
    pub async fn run_with_cancel(&self, options: &Metadata, cancel: &CancellationToken) -> EtlRunSummary {
        let span = tracing::info_span!(
            "etl.run",
            collectors = self.collectors.len(),
            validators = self.validators.len(),
            loaders = self.loaders.len()
        );
        async move {
            tracing::info!("Starting ETL pipeline");
            let mut summary = EtlRunSummary::default();

            if let Err(err) = self.execute(options, cancel, &mut summary).await {
                summary.cancelled = matches!(err, RadarError::Etl(EtlError::Cancelled));
                let message = format!("ETL pipeline failed: {}", err);
                tracing::error!(error = %err, "ETL pipeline failed");
                summary.errors.push(message);
            }

            tracing::info!(
                collected = summary.collected,
                validated = summary.validated,
                loaded = summary.loaded,
                errors = summary.errors.len(),
                "ETL pipeline completed"
            );
            summary
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        options: &Metadata,
        cancel: &CancellationToken,
        summary: &mut EtlRunSummary,
    ) -> RadarResult<()> {
        let documents = self.collect(options, cancel, summary).await?;
        let validated = self.validate(documents, cancel, summary).await?;
        self.load(&validated, cancel, summary).await
    }

    async fn collect(
        &self,
        options: &Metadata,
        cancel: &CancellationToken,
        summary: &mut EtlRunSummary,
    ) -> RadarResult<Vec<BudgetDocument>> {
        let mut documents = Vec::new();
        for collector in &self.collectors {
            checkpoint(cancel)?;
            match collector.collect(options).await {
                Ok(batch) => {
                    tracing::info!(collector = %collector.name(), documents = batch.len(), "Collected documents");
                    summary.collected += batch.len();
                    documents.extend(batch);
                }
                Err(err) => {
                    let message = format!("Collection failed for {}: {}", collector.name(), err);
                    tracing::error!(collector = %collector.name(), error = %err, "Collection failed");
                    summary.errors.push(message);
                }
            }
        }
        Ok(documents)
    }

    async fn validate(
        &self,
        documents: Vec<BudgetDocument>,
        cancel: &CancellationToken,
        summary: &mut EtlRunSummary,
    ) -> RadarResult<Vec<BudgetDocument>> {
        let mut validated = Vec::with_capacity(documents.len());
        for document in documents {
            checkpoint(cancel)?;
            if self.accepts(&document, &mut summary.errors).await {
                summary.validated += 1;
                validated.push(document);
            }
        }
        Ok(validated)
    }

    /// First rejecting validator wins; later validators are not consulted.
    async fn accepts(&self, document: &BudgetDocument, errors: &mut Vec<String>) -> bool {
        for validator in &self.validators {
            match validator.validate(document).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(
                        validator = %validator.name(),
                        city = %document.city_name,
                        year = document.year,
                        "Document rejected"
                    );
                    errors.extend(validator.validation_errors(document));
                    return false;
                }
                Err(err) => {
                    errors.push(format!("Validation failed for {}: {}", validator.name(), err));
                    return false;
                }
            }
        }
        true
    }

    async fn load(
        &self,
        documents: &[BudgetDocument],
        cancel: &CancellationToken,
        summary: &mut EtlRunSummary,
    ) -> RadarResult<()> {
        for loader in &self.loaders {
            checkpoint(cancel)?;
            match loader.load(documents).await {
                Ok(true) => {
                    tracing::info!(loader = %loader.name(), documents = documents.len(), "Loaded documents");
                    summary.loaded += documents.len();
                }
                Ok(false) => summary.errors.push(format!("Loading failed for {}", loader.name())),
                Err(err) => {
                    let message = format!("Loading failed for {}: {}", loader.name(), err);
                    tracing::error!(loader = %loader.name(), error = %err, "Loading failed");
                    summary.errors.push(message);
                }
            }
        }
        Ok(())
    }

    /// Parse one file with the first parser that supports its format.
    pub async fn parse_document(&self, path: &Path, options: &Metadata) -> RadarResult<Vec<BudgetDocument>> {
        let parser = self
            .parsers
            .iter()
            .find(|p| p.supports_format(path))
            .ok_or_else(|| EtlError::UnsupportedFormat {
                path: path.display().to_string(),
            })?;
        tracing::debug!(parser = %parser.name(), path = %path.display(), "Parsing document");
        parser.parse(path, options).await
    }

    /// One check per collector and loader, in registration order.
    pub async fn health_check(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::with_capacity(self.collectors.len() + self.loaders.len());
        for collector in &self.collectors {
            checks.push(HealthCheck::from_probe(
                format!("collector.{}", collector.name()),
                collector.validate_config(),
                "invalid configuration",
            ));
        }
        for loader in &self.loaders {
            let started = Instant::now();
            let ok = loader.health_check().await;
            checks.push(
                HealthCheck::from_probe(format!("loader.{}", loader.name()), ok, "health check failed")
                    .with_response_time(started.elapsed().as_millis() as i64),
            );
        }
        checks
    }
}

impl std::fmt::Debug for EtlPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |items: Vec<&str>| items.join(", ");
        f.debug_struct("EtlPipeline")
            .field("collectors", &names(self.collectors.iter().map(|c| c.name()).collect()))
            .field("parsers", &names(self.parsers.iter().map(|p| p.name()).collect()))
            .field("validators", &names(self.validators.iter().map(|v| v.name()).collect()))
            .field("loaders", &names(self.loaders.iter().map(|l| l.name()).collect()))
            .finish()
    }
}

fn checkpoint(cancel: &CancellationToken) -> RadarResult<()> {
    if cancel.is_cancelled() {
        return Err(EtlError::Cancelled.into());
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
