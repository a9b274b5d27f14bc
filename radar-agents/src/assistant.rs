//! General-purpose assistant agent backed by a chat model.

use crate::agent::{Agent, AgentCore};
use crate::message::{content, AgentCapability, Message, MessageType, Task, TaskResult};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use radar_core::{AgentError, RadarError, RadarResult};
use radar_llm::{ChatModel, GenerationParams};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Default id of the assistant agent.
pub const ASSISTANT_ID: &str = "assistant";

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant for the Mairie Radar system, \
which analyzes French municipal budget data for anomalies. \
You can help users understand budget information, explain financial terms, \
and provide insights about municipal spending.";

const MAX_INSIGHTS: usize = 5;

static INSIGHT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)insight|important").expect("valid insight regex"));

static BULLET_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-•]+").expect("valid bullet regex"));

/// Answer to a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub confidence: f64,
}

/// Result of a text analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub analysis: String,
    pub insights: Vec<String>,
}

/// Prompt family used by [`AssistantAgent::analyze`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    General,
    Budget,
    Anomaly,
}

impl AnalysisType {
    /// Unknown names fall back to `General`.
    pub fn parse(name: &str) -> Self {
        match name {
            "budget" => Self::Budget,
            "anomaly" => Self::Anomaly,
            _ => Self::General,
        }
    }

    fn prompt(self, text: &str) -> String {
        match self {
            Self::Budget => format!(
                "Analyze this budget-related text for key insights, anomalies, or important \
                 financial information:\n\n{}\n\nProvide a structured analysis with specific insights.",
                text
            ),
            Self::Anomaly => format!(
                "Look for potential anomalies or irregularities in this text:\n\n{}\n\n\
                 Identify any unusual patterns, discrepancies, or concerning elements.",
                text
            ),
            Self::General => format!("Analyze this text and provide insights:\n\n{}", text),
        }
    }
}

/// Chat confidence heuristic: grows with answer length, capped at 0.9.
pub fn chat_confidence(answer: &str) -> f64 {
    (answer.chars().count() as f64 / 200.0 + 0.3).min(0.9)
}

/// Pull up to five insight lines out of a model answer.
///
/// A line counts when it is a bullet (`-` or `•`) or mentions "insight" or
/// "important". Bullet markers are stripped.
pub fn extract_insights(answer: &str) -> Vec<String> {
    answer
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && (line.starts_with('-') || line.starts_with('•') || INSIGHT_MARKER.is_match(line))
        })
        .map(|line| BULLET_PREFIX.replace(line, "").trim().to_string())
        .take(MAX_INSIGHTS)
        .collect()
}

/// Agent exposing `chat` and `analyze_text` over a [`ChatModel`].
pub struct AssistantAgent {
    core: AgentCore,
    model: Option<Arc<dyn ChatModel>>,
    params: GenerationParams,
    initialized: AtomicBool,
}

impl AssistantAgent {
    pub fn new(model: Option<Arc<dyn ChatModel>>, params: GenerationParams) -> Self {
        Self::with_id(ASSISTANT_ID, model, params)
    }

    pub fn with_id(
        agent_id: impl Into<String>,
        model: Option<Arc<dyn ChatModel>>,
        params: GenerationParams,
    ) -> Self {
        Self {
            core: AgentCore::new(agent_id, "Assistant"),
            model,
            params,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Model name, when a model is configured.
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.model())
    }

    fn model(&self) -> RadarResult<&Arc<dyn ChatModel>> {
        self.model.as_ref().ok_or_else(|| {
            AgentError::NotInitialized {
                agent_id: self.id().to_string(),
            }
            .into()
        })
    }

    /// Answer a user message.
    ///
    /// Model failures become an apology with zero confidence; only a missing
    /// model is an error.
    pub async fn chat(&self, message: &str) -> RadarResult<ChatReply> {
        let model = self.model()?;
        let prompt = format!("{}\n\nUser: {}\nAssistant:", SYSTEM_PROMPT, message);
        match model.complete(&prompt, &self.params).await {
            Ok(response) => Ok(ChatReply {
                confidence: chat_confidence(&response),
                response,
            }),
            Err(err) => {
                tracing::error!(agent_id = %self.id(), error = %err, "Chat error");
                Ok(ChatReply {
                    response: format!("I'm sorry, I encountered an error: {}", err),
                    confidence: 0.0,
                })
            }
        }
    }

    /// Analyze `text` with the prompt for `analysis_type`.
    pub async fn analyze(&self, text: &str, analysis_type: AnalysisType) -> RadarResult<TextAnalysis> {
        let model = self.model()?;
        match model.complete(&analysis_type.prompt(text), &self.params).await {
            Ok(answer) => Ok(TextAnalysis {
                insights: extract_insights(&answer),
                analysis: answer,
            }),
            Err(err) => {
                tracing::error!(agent_id = %self.id(), error = %err, "Analysis error");
                Ok(TextAnalysis {
                    analysis: format!("Analysis failed: {}", err),
                    insights: Vec::new(),
                })
            }
        }
    }

    async fn respond(&self, message: &Message) -> RadarResult<Message> {
        let field = |key: &str| message.content.get(key).and_then(Value::as_str);
        match message.action() {
            Some("chat") => {
                let reply = self.chat(field("message").unwrap_or_default()).await?;
                Ok(message.reply(
                    self.id(),
                    MessageType::Response,
                    content([
                        ("action", json!("chat_response")),
                        ("response", json!(reply.response)),
                        ("confidence", json!(reply.confidence)),
                        ("timestamp", json!(Utc::now().to_rfc3339())),
                    ]),
                ))
            }
            Some("analyze_text") => {
                let analysis_type = AnalysisType::parse(field("analysis_type").unwrap_or("general"));
                let analysis = self
                    .analyze(field("text").unwrap_or_default(), analysis_type)
                    .await?;
                Ok(message.reply(
                    self.id(),
                    MessageType::Response,
                    content([
                        ("action", json!("analysis_response")),
                        ("analysis", json!(analysis.analysis)),
                        ("insights", json!(analysis.insights)),
                        ("timestamp", json!(Utc::now().to_rfc3339())),
                    ]),
                ))
            }
            action => Ok(message.reply(
                self.id(),
                MessageType::Error,
                content([
                    (
                        "error",
                        json!(format!("Unknown action: {}", action.unwrap_or("none"))),
                    ),
                    ("supported_actions", json!(["chat", "analyze_text"])),
                ]),
            )),
        }
    }

    async fn run_task(&self, task: &Task) -> RadarResult<Value> {
        match task.task_type() {
            Some("chat") => {
                let reply = self.chat(task.str_param("message").unwrap_or_default()).await?;
                Ok(json!(reply))
            }
            Some("analyze_text") => {
                let analysis_type =
                    AnalysisType::parse(task.str_param("analysis_type").unwrap_or("general"));
                let analysis = self
                    .analyze(task.str_param("text").unwrap_or_default(), analysis_type)
                    .await?;
                Ok(json!(analysis))
            }
            other => Err(AgentError::TaskFailed {
                task_id: task.id.clone(),
                reason: format!("Unknown task type: {}", other.unwrap_or("none")),
            }
            .into()),
        }
    }
}

#[async_trait]
impl Agent for AssistantAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn initialize(&self) -> bool {
        let Some(model) = self.model.as_deref() else {
            tracing::error!(agent_id = %self.id(), "Failed to initialize: no chat model configured");
            return false;
        };

        self.core.add_capability(
            AgentCapability::new("chat", "Chat with the configured language model")
                .with_input("message", "string")
                .with_output("response", "string")
                .with_output("confidence", "float"),
        );
        self.core.add_capability(
            AgentCapability::new("analyze_text", "Analyze text for insights")
                .with_input("text", "string")
                .with_input("analysis_type", "string")
                .with_output("analysis", "string")
                .with_output("insights", "array"),
        );
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(
            agent_id = %self.id(),
            provider = %model.provider(),
            model = %model.model(),
            "Assistant initialized"
        );
        true
    }

    async fn process_message(&self, message: Message) -> Option<Message> {
        match self.respond(&message).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                tracing::error!(agent_id = %self.id(), error = %err, "Error processing message");
                Some(message.error_reply(self.id(), err))
            }
        }
    }

    async fn execute_task(&self, task: Task) -> TaskResult {
        let started = Instant::now();
        match self.run_task(&task).await {
            Ok(result) => {
                let model = self.model_name().unwrap_or_default().to_string();
                TaskResult::success(task.id, self.id(), result)
                    .with_execution_time(started.elapsed())
                    .with_metadata("model", json!(model))
            }
            Err(RadarError::Agent(AgentError::TaskFailed { reason, .. })) => {
                TaskResult::failure(task.id, self.id(), reason).with_execution_time(started.elapsed())
            }
            Err(err) => TaskResult::failure(task.id, self.id(), err.to_string())
                .with_execution_time(started.elapsed()),
        }
    }
}

impl std::fmt::Debug for AssistantAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantAgent")
            .field("id", &self.core.id())
            .field("model", &self.model_name())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
