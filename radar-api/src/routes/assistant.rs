//! Assistant agent endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use radar_agents::{Agent, AgentCapability, AnalysisType};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub confidence: f64,
    pub agent_id: String,
}

fn general() -> String {
    "general".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(default = "general")]
    pub analysis_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub insights: Vec<String>,
    pub agent_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub agent_id: String,
    pub agent_name: String,
    pub capabilities: Vec<AgentCapability>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let assistant = state.ready_assistant()?;
    let preview: String = request.message.chars().take(50).collect();
    tracing::info!(message = %preview, "Chat request");

    let reply = assistant.chat(&request.message).await?;
    tracing::info!(confidence = reply.confidence, "Chat response generated");

    Ok(Json(ChatResponse {
        response: reply.response,
        confidence: reply.confidence,
        agent_id: assistant.id().to_string(),
    }))
}

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> ApiResult<Json<AnalysisResponse>> {
    let assistant = state.ready_assistant()?;
    tracing::info!(
        analysis_type = %request.analysis_type,
        characters = request.text.chars().count(),
        "Analysis request"
    );

    let analysis = assistant
        .analyze(&request.text, AnalysisType::parse(&request.analysis_type))
        .await?;
    tracing::info!(insights = analysis.insights.len(), "Analysis completed");

    Ok(Json(AnalysisResponse {
        analysis: analysis.analysis,
        insights: analysis.insights,
        agent_id: assistant.id().to_string(),
    }))
}

/// GET /agent/capabilities - available even before initialization.
pub async fn capabilities(State(state): State<AppState>) -> ApiResult<Json<CapabilitiesResponse>> {
    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Assistant agent not available"))?;
    Ok(Json(CapabilitiesResponse {
        agent_id: assistant.id().to_string(),
        agent_name: assistant.name().to_string(),
        capabilities: assistant.capabilities(),
    }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/analyze", post(analyze))
        .route("/agent/capabilities", get(capabilities))
        .with_state(state)
}
