//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use radar_agents::{Agent, AssistantAgent, CoordinatorAgent};
use radar_core::RadarConfig;
use radar_etl::{BasicValidator, EtlPipeline};
use radar_llm::{build_chat_model, GenerationParams};
use radar_rag::RagPipeline;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};

/// Application-wide state shared across all routes.
///
/// Optional components answer 503 from their endpoints when absent.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RadarConfig>,
    pub coordinator: Arc<CoordinatorAgent>,
    pub assistant: Option<Arc<AssistantAgent>>,
    pub etl: Option<Arc<EtlPipeline>>,
    pub rag: Option<Arc<RagPipeline>>,
    /// Cancelled on shutdown; long-running pipeline calls observe it.
    pub shutdown: CancellationToken,
    pub start_time: Instant,
}

impl AppState {
    /// State with only a coordinator.
    pub fn new(config: RadarConfig) -> Self {
        let coordinator = Arc::new(CoordinatorAgent::new(&config.agents));
        Self {
            config: Arc::new(config),
            coordinator,
            assistant: None,
            etl: None,
            rag: None,
            shutdown: CancellationToken::new(),
            start_time: Instant::now(),
        }
    }

    pub fn with_assistant(mut self, assistant: Arc<AssistantAgent>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn with_etl(mut self, pipeline: EtlPipeline) -> Self {
        self.etl = Some(Arc::new(pipeline));
        self
    }

    pub fn with_rag(mut self, pipeline: RagPipeline) -> Self {
        self.rag = Some(Arc::new(pipeline));
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Wire the components the configuration allows.
    ///
    /// The assistant is created from the resolved LLM provider and attached
    /// to the coordinator. A missing or unsupported provider leaves the
    /// assistant uninitialized instead of failing startup. The ETL pipeline
    /// starts with the structural validator only; collectors and loaders are
    /// plugged in by deployments that ship them, and RAG stays off until a
    /// retriever and generator are provided.
    pub async fn bootstrap(config: RadarConfig) -> Self {
        let resolved = config.llm_provider().and_then(|provider| {
            let model = build_chat_model(&provider)?;
            Ok((model, GenerationParams::from_config(&provider)))
        });
        let (model, params) = match resolved {
            Ok((model, params)) => (Some(model), params),
            Err(err) => {
                tracing::warn!(error = %err, "No chat model available, assistant disabled");
                (None, GenerationParams::default())
            }
        };

        let assistant = Arc::new(AssistantAgent::new(model, params));
        if assistant.initialize().await {
            tracing::info!(agent_id = %assistant.id(), "Assistant agent initialized successfully");
        } else {
            tracing::error!(agent_id = %assistant.id(), "Failed to initialize assistant agent");
        }

        let state = Self::new(config).with_assistant(assistant.clone());
        state.coordinator.initialize().await;
        state.coordinator.attach_agent(assistant).await;

        let mut etl = EtlPipeline::new();
        etl.add_validator(Arc::new(BasicValidator::new()));
        state.with_etl(etl)
    }

    /// The assistant, provided it is present and initialized.
    pub fn ready_assistant(&self) -> ApiResult<&Arc<AssistantAgent>> {
        let assistant = self
            .assistant
            .as_ref()
            .ok_or_else(|| ApiError::service_unavailable("Assistant agent not available"))?;
        if !assistant.is_initialized() {
            return Err(ApiError::service_unavailable("Assistant agent not initialized"));
        }
        Ok(assistant)
    }

    /// `initialized` or `not_initialized`, as reported by the health endpoints.
    pub fn agent_status(&self) -> &'static str {
        match &self.assistant {
            Some(assistant) if assistant.is_initialized() => "initialized",
            _ => "not_initialized",
        }
    }

    pub fn etl(&self) -> ApiResult<&Arc<EtlPipeline>> {
        self.etl
            .as_ref()
            .ok_or_else(|| ApiError::service_unavailable("ETL pipeline not configured"))
    }

    pub fn rag(&self) -> ApiResult<&Arc<RagPipeline>> {
        self.rag
            .as_ref()
            .ok_or_else(|| ApiError::service_unavailable("RAG pipeline not configured"))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("app_name", &self.config.app.app_name)
            .field("agent_status", &self.agent_status())
            .field("etl", &self.etl.is_some())
            .field("rag", &self.rag.is_some())
            .finish()
    }
}
