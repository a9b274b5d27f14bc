//! REST API Routes Module
//!
//! Route handlers grouped by component:
//! - Health and public configuration
//! - Assistant agent (chat, analysis, capabilities)
//! - Coordinator workflows and agent registry
//! - ETL and RAG pipelines
//! - CORS support for the browser dashboard

pub mod assistant;
pub mod config;
pub mod etl;
pub mod health;
pub mod rag;
pub mod workflow;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use radar_core::ApiSettings;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use assistant::create_router as assistant_router;
pub use config::create_router as config_router;
pub use etl::create_router as etl_router;
pub use health::create_router as health_router;
pub use rag::create_router as rag_router;
pub use workflow::create_router as workflow_router;

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from the API settings.
///
/// Configured origins are allowed with credentials. An empty list or a `*`
/// entry allows every origin without credentials.
pub fn build_cors_layer(settings: &ApiSettings) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if settings.cors_origins.is_empty() || settings.cors_origins.iter().any(|o| o.trim() == "*") {
        tracing::info!("CORS: allowing all origins");
        return cors.allow_origin(Any);
    }

    tracing::info!(origins = ?settings.cors_origins, "CORS: allowing configured origins");
    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(origins).allow_credentials(true)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// - `/`, `/health`, `/health/components`
/// - `/config`
/// - `/chat`, `/analyze`, `/agent/capabilities`
/// - `/workflows`, `/workflows/:workflow_id`, `/agents`
/// - `/etl/run`, `/etl/health`
/// - `/rag/query`, `/rag/batch`
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.api);

    Router::new()
        .merge(health::create_router(state.clone()))
        .merge(config::create_router(state.clone()))
        .merge(assistant::create_router(state.clone()))
        .merge(workflow::create_router(state.clone()))
        .nest("/etl", etl::create_router(state.clone()))
        .nest("/rag", rag::create_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
