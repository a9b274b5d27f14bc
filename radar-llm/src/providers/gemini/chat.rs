//! Gemini chat model

use super::client::{GeminiClient, PROVIDER};
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use crate::{empty_completion, ChatModel, GenerationParams};
use async_trait::async_trait;
use radar_core::RadarResult;

/// Chat model backed by Gemini `generateContent`.
#[derive(Debug)]
pub struct GeminiChatModel {
    client: GeminiClient,
    model: String,
}

impl GeminiChatModel {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub(crate) fn build_request(prompt: &str, params: &GenerationParams) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            }),
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> RadarResult<String> {
        let request = Self::build_request(prompt, params);
        let response: GenerateContentResponse = self
            .client
            .call(&self.model, "generateContent", request)
            .await?;

        response.text().ok_or_else(|| empty_completion(PROVIDER))
    }
}
