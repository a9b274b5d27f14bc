//! Mairie Radar LLM - Chat Model Abstraction
//!
//! Provider-agnostic trait for text completion plus HTTP clients for the
//! hosted providers the platform supports.

pub mod providers;

use async_trait::async_trait;
use radar_core::{
    ConfigError, LlmError, LlmProvider, LlmProviderConfig, RadarResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use providers::{GeminiChatModel, GeminiClient, OpenAiChatModel, OpenAiClient};

// ============================================================================
// CHAT MODEL TRAIT
// ============================================================================

/// Sampling parameters for one completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl GenerationParams {
    pub fn from_config(config: &LlmProviderConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Trait for text completion models.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider identifier (e.g., "google", "openai").
    fn provider(&self) -> &str;

    /// Model identifier (e.g., "gemini-2.0-flash-exp").
    fn model(&self) -> &str;

    /// Complete a single prompt.
    ///
    /// # Arguments
    /// * `prompt` - Full prompt text, including any system preamble
    /// * `params` - Sampling parameters
    ///
    /// # Returns
    /// * `Ok(String)` - The generated text
    /// * `Err(RadarError::Llm)` - If the provider request fails
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> RadarResult<String>;
}

/// Build the chat model for a resolved provider configuration.
///
/// Anthropic keys are accepted by configuration but no client is shipped for
/// them yet.
pub fn build_chat_model(config: &LlmProviderConfig) -> RadarResult<Arc<dyn ChatModel>> {
    match config.provider {
        LlmProvider::Google => Ok(Arc::new(GeminiChatModel::new(
            GeminiClient::new(config.api_key.clone(), config.requests_per_minute),
            config.model.clone(),
        ))),
        LlmProvider::OpenAi => Ok(Arc::new(OpenAiChatModel::new(
            OpenAiClient::new(config.api_key.clone(), config.requests_per_minute),
            config.model.clone(),
        ))),
        LlmProvider::Anthropic => Err(ConfigError::ProviderNotSupported {
            provider: config.provider.to_string(),
        }
        .into()),
    }
}

/// Error for a completion with no usable text.
pub(crate) fn empty_completion(provider: &str) -> radar_core::RadarError {
    LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: "No content in response".to_string(),
    }
    .into()
}

// ============================================================================
// TESTS
// ============================================================================
