//! ETL pipeline endpoints, nested under `/etl`.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use radar_core::{HealthCheck, Metadata};
use radar_etl::EtlRunSummary;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EtlRunRequest {
    /// Passed to every collector.
    #[serde(default)]
    pub options: Metadata,
}

/// POST /etl/run - stage failures are listed in the summary, not as an error status.
pub async fn run(
    State(state): State<AppState>,
    request: Option<Json<EtlRunRequest>>,
) -> ApiResult<Json<EtlRunSummary>> {
    let pipeline = state.etl()?;
    let options = request.map(|Json(r)| r.options).unwrap_or_default();
    let summary = pipeline.run_with_cancel(&options, &state.shutdown).await;
    Ok(Json(summary))
}

/// GET /etl/health
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Vec<HealthCheck>>> {
    let pipeline = state.etl()?;
    Ok(Json(pipeline.health_check().await))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/run", post(run))
        .route("/health", get(health))
        .with_state(state)
}
