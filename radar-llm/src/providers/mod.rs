//! Hosted LLM provider implementations
//!
//! Each provider has an HTTP client with request pacing and a
//! [`ChatModel`](crate::ChatModel) implementation on top of it.

pub mod gemini;
pub mod openai;
mod rate_limit;

pub use gemini::{GeminiChatModel, GeminiClient};
pub use openai::{OpenAiChatModel, OpenAiClient};
pub(crate) use rate_limit::RateLimiter;

use radar_core::{LlmError, RadarError};

pub(crate) fn request_failed(provider: &str, status: i32, message: impl Into<String>) -> RadarError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    }
    .into()
}

pub(crate) fn rate_limited(provider: &str, retry_after_ms: i64) -> RadarError {
    LlmError::RateLimited {
        provider: provider.to_string(),
        retry_after_ms,
    }
    .into()
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> RadarError {
    LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
    .into()
}

pub(crate) fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<i64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<f64>().ok())
        .map(|seconds| (seconds * 1000.0) as i64)
}
