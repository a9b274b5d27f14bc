//! Tracing subscriber setup for the API binary.
//!
//! `RUST_LOG` wins when set; otherwise the configured `LOG_LEVEL` applies to
//! every crate. Debug mode logs human-readable lines, anything else logs JSON.

use radar_core::AppSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

/// Map a configured log level name onto a tracing directive.
///
/// Accepts the usual names case-insensitively, including `WARNING` and
/// `CRITICAL`. Unknown names fall back to `info`.
pub fn level_directive(log_level: &str) -> &'static str {
    match log_level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        "off" => "off",
        _ => "info",
    }
}

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(app: &AppSettings) -> String {
    let level = level_directive(&app.log_level);
    format!("{level},tower_http={level}")
}

/// Install the global subscriber. Call once at startup.
pub fn init_tracing(app: &AppSettings) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(app)));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if app.debug {
        registry.with(tracing_subscriber::fmt::layer().pretty()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    };
    installed.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        app_name = %app.app_name,
        environment = %app.environment,
        debug = app.debug,
        "Telemetry initialized"
    );
    Ok(())
}
