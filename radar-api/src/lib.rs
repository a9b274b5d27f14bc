//! Mairie Radar API - REST Layer
//!
//! Axum endpoints over the assistant agent, the coordinator, and the ETL and
//! RAG pipelines.

pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use state::AppState;
