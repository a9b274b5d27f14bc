//! Health Check Endpoints
//!
//! - `/` and `/health` - liveness plus assistant status
//! - `/health/components` - per-component checks for pipelines and agents

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use radar_agents::{Agent, AgentStatus};
use radar_core::{aggregate_status, HealthCheck, HealthStatus};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub agent_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub status: HealthStatus,
    pub uptime_seconds: u64,
    pub checks: Vec<HealthCheck>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET / and GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.config.app.app_version.clone(),
        agent_status: state.agent_status().to_string(),
    })
}

/// GET /health/components - 503 when any component is unhealthy.
pub async fn components(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = Vec::new();

    let coordinator = &state.coordinator;
    checks.push(HealthCheck::from_probe(
        format!("agent.{}", coordinator.id()),
        coordinator.status() != AgentStatus::Error,
        "coordinator in error state",
    ));
    match &state.assistant {
        Some(assistant) => checks.push(HealthCheck::from_probe(
            format!("agent.{}", assistant.id()),
            assistant.is_initialized(),
            "no chat model configured",
        )),
        None => checks.push(HealthCheck::degraded("agent.assistant", "not available")),
    }
    if let Some(etl) = &state.etl {
        checks.extend(etl.health_check().await);
    }

    let status = aggregate_status(&checks);
    let code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let report = ComponentReport {
        status,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        checks,
    };
    (code, Json(report))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/health/components", get(components))
        .with_state(state)
}
