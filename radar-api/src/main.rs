//! Mairie Radar API Server Entry Point
//!
//! Loads `.env`, validates configuration, wires the agents and pipelines and
//! serves the Axum router until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use radar_agents::{Agent, AgentRuntime};
use radar_api::telemetry::init_tracing;
use radar_api::{create_router, ApiError, ApiResult, AppState};
use radar_core::{ApiSettings, RadarConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ApiResult<()> {
    dotenvy::dotenv().ok();

    let config = RadarConfig::from_env();
    init_tracing(&config.app)?;
    config.validate()?;

    tracing::info!(
        environment = %config.app.environment,
        debug = config.app.debug,
        "Starting Mairie Radar API"
    );

    let addr = resolve_bind_addr(&config.api)?;
    let agent_settings = config.agents.clone();
    let shutdown = CancellationToken::new();
    let state = AppState::bootstrap(config)
        .await
        .with_shutdown(shutdown.clone());

    let mut runtime = AgentRuntime::new(agent_settings);
    runtime.register(state.coordinator.clone());
    if let Some(assistant) = &state.assistant {
        let assistant: Arc<dyn Agent> = assistant.clone();
        runtime.register(assistant);
    }
    let agents_cancel = shutdown.clone();
    let agents = tokio::spawn(async move { runtime.run_all(agents_cancel).await });

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(%addr, "Listening");

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    shutdown.cancel();
    if let Err(err) = agents.await {
        tracing::warn!(error = %err, "Agent runtime did not stop cleanly");
    }
    tracing::info!("Shutting down Mairie Radar API");
    Ok(())
}

fn resolve_bind_addr(settings: &ApiSettings) -> ApiResult<SocketAddr> {
    let addr = format!("{}:{}", settings.host, settings.port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
