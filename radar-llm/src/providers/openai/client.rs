//! OpenAI HTTP client with rate limiting

use super::types::ApiError;
use crate::providers::{
    invalid_response, parse_retry_after_ms, rate_limited, request_failed, RateLimiter,
};
use radar_core::RadarResult;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

pub(crate) const PROVIDER: &str = "openai";

/// OpenAI API client with rate limiting.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    limiter: RateLimiter,
}

impl OpenAiClient {
    /// Create a new OpenAI client.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `requests_per_minute` - Maximum requests per minute
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            limiter: RateLimiter::new(requests_per_minute),
        }
    }

    /// Point the client at an OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an API request with automatic rate limiting.
    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Req,
    ) -> RadarResult<Res> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| request_failed(PROVIDER, 0, e))?;

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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
            tracing::warn!(status = %status, "OpenAI request failed");

            Err(match status {
                StatusCode::TOO_MANY_REQUESTS => rate_limited(PROVIDER, retry_after_ms),
                _ => request_failed(PROVIDER, status.as_u16() as i32, error_message(&error_text)),
            })
        }
    }
}

/// Extract the provider's error message, falling back to the raw body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let client = OpenAiClient::new("sk-secret", 60);
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let client = OpenAiClient::new("k", 60).with_base_url("http://localhost:11434/v1/");
        assert_eq!(client.base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_error_message_parsing() {
        let body = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
        assert_eq!(error_message(body), "Invalid API key");
        assert_eq!(error_message("gateway down"), "gateway down");
    }
}
