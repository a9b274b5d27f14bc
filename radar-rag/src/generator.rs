//! Answer generation with a chat model.

use crate::{Generator, QueryResult};
use async_trait::async_trait;
use radar_core::{Metadata, RadarResult, RagError};
use radar_llm::{ChatModel, GenerationParams};
use std::sync::Arc;

/// Prompt used unless a custom template is set. `{context}` and `{query}` are
/// substituted.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are an assistant analyzing French municipal budget data.
Answer the question using only the context below. If the context does not contain the answer, say so.

Context:
{context}

Question: {query}

Answer:";

/// Number each retrieved document and render it for a prompt.
pub fn format_context(context: &[QueryResult]) -> String {
    if context.is_empty() {
        return "No relevant documents found.".to_string();
    }
    context
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let doc = &result.document;
            format!(
                "[{}] {} {} - {} ({:.2} EUR, score {:.3})\n{}",
                i + 1,
                doc.city_name,
                doc.year,
                doc.category,
                doc.amount,
                result.score,
                doc.embedding_text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Generator that fills a prompt template and asks a [`ChatModel`].
///
/// Confidence is the mean source score clamped to `[0, 1]`, and `0.0` when
/// there is no context.
pub struct LlmGenerator {
    model: Arc<dyn ChatModel>,
    params: GenerationParams,
    template: String,
}

impl LlmGenerator {
    pub fn new(model: Arc<dyn ChatModel>, params: GenerationParams) -> Self {
        Self {
            model,
            params,
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn build_prompt(&self, query: &str, context: &[QueryResult]) -> String {
        self.template
            .replace("{query}", query)
            .replace("{context}", &format_context(context))
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    fn name(&self) -> &str {
        self.model.provider()
    }

    async fn generate(&self, query: &str, context: &[QueryResult], _extra: &Metadata) -> RadarResult<String> {
        let prompt = self.build_prompt(query, context);
        self.model
            .complete(&prompt, &self.params)
            .await
            .map_err(|e| {
                RagError::GenerationFailed {
                    reason: e.to_string(),
                }
                .into()
            })
    }

    fn prompt_template(&self) -> &str {
        &self.template
    }

    async fn estimate_confidence(&self, _query: &str, _answer: &str, context: &[QueryResult]) -> RadarResult<f64> {
        if context.is_empty() {
            return Ok(0.0);
        }
        let mean = context.iter().map(|r| r.score).sum::<f64>() / context.len() as f64;
        Ok(mean.clamp(0.0, 1.0))
    }
}

impl std::fmt::Debug for LlmGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGenerator")
            .field("provider", &self.model.provider())
            .field("model", &self.model.model())
            .field("params", &self.params)
            .finish()
    }
}
