//! OpenAI chat model

use super::client::{OpenAiClient, PROVIDER};
use super::types::{ChatMessage, CompletionRequest, CompletionResponse};
use crate::{empty_completion, ChatModel, GenerationParams};
use async_trait::async_trait;
use radar_core::RadarResult;

/// Chat model backed by the OpenAI chat completions endpoint.
#[derive(Debug)]
pub struct OpenAiChatModel {
    client: OpenAiClient,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub(crate) fn build_request(&self, prompt: &str, params: &GenerationParams) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(params.max_tokens),
            temperature: Some(params.temperature),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> RadarResult<String> {
        let request = self.build_request(prompt, params);
        let response: CompletionResponse =
            self.client.request("chat/completions", request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| empty_completion(PROVIDER))
    }
}
