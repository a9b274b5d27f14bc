//! Gemini HTTP client with rate limiting

use super::types::ApiError;
use crate::providers::{
    invalid_response, parse_retry_after_ms, rate_limited, request_failed, RateLimiter,
};
use radar_core::RadarResult;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

pub(crate) const PROVIDER: &str = "google";

/// Google Generative Language API client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    limiter: RateLimiter,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Arguments
    /// * `api_key` - Google AI Studio API key
    /// * `requests_per_minute` - Maximum requests per minute
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            limiter: RateLimiter::new(requests_per_minute),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// URL of a model method, e.g. `models/gemini-2.0-flash-exp:generateContent`.
    pub fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// Call a model method with automatic rate limiting.
    pub async fn call<Req: Serialize, Res: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        body: Req,
    ) -> RadarResult<Res> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| request_failed(PROVIDER, 0, e))?;

        let response = self
            .client
            .post(self.model_url(model, method))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed(PROVIDER, 0, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let retry_after_ms = parse_retry_after_ms(response.headers()).unwrap_or(0);

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| invalid_response(PROVIDER, format!("Failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = %status, model, "Gemini request failed");

            Err(match status {
                StatusCode::TOO_MANY_REQUESTS => rate_limited(PROVIDER, retry_after_ms),
                _ => request_failed(PROVIDER, status.as_u16() as i32, error_message(&error_text)),
            })
        }
    }
}

pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api_error) => match api_error.error.status {
            Some(status) => format!("{} ({})", api_error.error.message, status),
            None => api_error.error.message,
        },
        Err(_) => body.to_string(),
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
