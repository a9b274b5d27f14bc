//! RAG endpoints, nested under `/rag`.

use axum::{extract::State, routing::post, Json, Router};
use radar_rag::{QueryOptions, RagResponse};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagQueryRequest {
    pub query: String,
    #[serde(default)]
    pub options: QueryOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagBatchRequest {
    pub queries: Vec<String>,
    #[serde(default)]
    pub options: QueryOptions,
}

/// POST /rag/query - a pipeline failure is a 500 with the error message.
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<RagQueryRequest>,
) -> ApiResult<Json<RagResponse>> {
    let pipeline = state.rag()?;
    if request.query.trim().is_empty() {
        return Err(ApiError::missing_field("query"));
    }
    let response = pipeline
        .query(&request.query, &request.options)
        .await
        .map_err(|err| ApiError::internal_error(err.to_string()))?;
    Ok(Json(response))
}

/// POST /rag/batch - always 200; failed queries come back degraded in place.
pub async fn batch(
    State(state): State<AppState>,
    Json(request): Json<RagBatchRequest>,
) -> ApiResult<Json<Vec<RagResponse>>> {
    let pipeline = state.rag()?;
    let responses = pipeline
        .batch_query_with_cancel(&request.queries, &request.options, &state.shutdown)
        .await;
    Ok(Json(responses))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/batch", post(batch))
        .with_state(state)
}
