//! Coordinator endpoints: workflows and the agent registry.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use radar_agents::{RegistryEntry, Task, Workflow};
use radar_core::new_entity_id;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// Generated when omitted.
    #[serde(default)]
    pub workflow_id: Option<String>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentEntry {
    pub agent_id: String,
    #[serde(flatten)]
    pub entry: RegistryEntry,
}

/// POST /workflows - 200 whatever the workflow outcome; its status says how it went.
pub async fn start_workflow(
    State(state): State<AppState>,
    Json(request): Json<WorkflowRequest>,
) -> ApiResult<Json<Workflow>> {
    let workflow_id = request
        .workflow_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| new_entity_id().to_string());

    let workflow = state
        .coordinator
        .orchestrate_workflow(&workflow_id, request.tasks)
        .await;
    Ok(Json(workflow))
}

/// GET /workflows
pub async fn list_workflows(State(state): State<AppState>) -> Json<Vec<Workflow>> {
    Json(state.coordinator.workflows().await)
}

/// GET /workflows/:workflow_id
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> ApiResult<Json<Workflow>> {
    state
        .coordinator
        .workflow(&workflow_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::workflow_not_found(&workflow_id))
}

/// GET /agents - registry in registration order.
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentEntry>> {
    let agents = state
        .coordinator
        .registered_agents()
        .await
        .into_iter()
        .map(|(agent_id, entry)| AgentEntry { agent_id, entry })
        .collect();
    Json(agents)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/workflows", get(list_workflows).post(start_workflow))
        .route("/workflows/:workflow_id", get(get_workflow))
        .route("/agents", get(list_agents))
        .with_state(state)
}
