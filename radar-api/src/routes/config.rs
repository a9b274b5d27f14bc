//! Public configuration endpoint.

use axum::{extract::State, routing::get, Json, Router};
use radar_core::FeatureFlags;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Configuration safe to expose to clients. No keys or URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicConfig {
    pub app_name: String,
    pub version: String,
    pub environment: String,
    pub debug: bool,
    pub features: FeatureFlags,
}

/// GET /config
pub async fn get_config(State(state): State<AppState>) -> Json<PublicConfig> {
    let app = &state.config.app;
    Json(PublicConfig {
        app_name: app.app_name.clone(),
        version: app.app_version.clone(),
        environment: app.environment.clone(),
        debug: app.debug,
        features: state.config.features.clone(),
    })
}

pub fn create_router(state: AppState) -> Router {
    Router::new().route("/config", get(get_config)).with_state(state)
}
