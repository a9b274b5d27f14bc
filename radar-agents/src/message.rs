//! Messages, capabilities, tasks and task results exchanged between agents.

use chrono::Utc;
use radar_core::{new_entity_id, AgentError, EntityId, Metadata, RadarResult, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

// ============================================================================
// MESSAGES
// ============================================================================

/// Kind of an inter-agent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Notification,
    Error,
    Heartbeat,
}

/// One unit of inter-agent communication.
///
/// Messages are immutable once built. Replies must be built with
/// [`Message::reply`] so that `correlation_id` always names the message
/// being answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: EntityId,
    pub sender: String,
    pub receiver: String,
    pub message_type: MessageType,
    #[serde(default)]
    pub content: Metadata,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub correlation_id: Option<EntityId>,
}

impl Message {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        message_type: MessageType,
        content: Metadata,
    ) -> Self {
        Self {
            id: new_entity_id(),
            sender: sender.into(),
            receiver: receiver.into(),
            message_type,
            content,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    pub fn request(sender: impl Into<String>, receiver: impl Into<String>, content: Metadata) -> Self {
        Self::new(sender, receiver, MessageType::Request, content)
    }

    pub fn notification(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: Metadata,
    ) -> Self {
        Self::new(sender, receiver, MessageType::Notification, content)
    }

    pub fn heartbeat(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self::new(sender, receiver, MessageType::Heartbeat, Metadata::new())
    }

    /// Build a reply addressed to this message's sender.
    pub fn reply(&self, from: impl Into<String>, message_type: MessageType, content: Metadata) -> Self {
        Self {
            correlation_id: Some(self.id),
            ..Self::new(from, self.sender.clone(), message_type, content)
        }
    }

    /// Build an ERROR reply carrying a failure description.
    pub fn error_reply(&self, from: impl Into<String>, error: impl fmt::Display) -> Self {
        let mut content = Metadata::new();
        content.insert("error".to_string(), Value::String(error.to_string()));
        self.reply(from, MessageType::Error, content)
    }

    /// The `action` field of the content, if it is a string.
    pub fn action(&self) -> Option<&str> {
        self.content.get("action").and_then(Value::as_str)
    }

    pub fn is_reply_to(&self, other: &Message) -> bool {
        self.correlation_id == Some(other.id)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(value: Value) -> RadarResult<Self> {
        serde_json::from_value(value).map_err(|e| {
            AgentError::InvalidMessage {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Build a content map from `(key, value)` pairs.
pub fn content<I, K>(pairs: I) -> Metadata
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// A named operation an agent can perform.
///
/// Schemas are descriptive field-to-type mappings, not enforced types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCapability {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub input_schema: Metadata,
    #[serde(default)]
    pub output_schema: Metadata,
}

impl AgentCapability {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: Metadata::new(),
            output_schema: Metadata::new(),
        }
    }

    pub fn with_input(mut self, field: impl Into<String>, kind: impl Into<String>) -> Self {
        self.input_schema
            .insert(field.into(), Value::String(kind.into()));
        self
    }

    pub fn with_output(mut self, field: impl Into<String>, kind: impl Into<String>) -> Self {
        self.output_schema
            .insert(field.into(), Value::String(kind.into()));
        self
    }
}

/// Agent lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Busy,
    Error,
    Offline,
}

// ============================================================================
// TASKS
// ============================================================================

/// A unit of work routed to an agent.
///
/// `capability` drives routing in a workflow; `kind` (the `type` field)
/// selects the handler inside the executing agent. Any other fields are
/// handler parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "generate_task_id")]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(flatten)]
    pub params: Metadata,
}

fn generate_task_id() -> String {
    new_entity_id().to_string()
}

impl Task {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            capability: None,
            params: Metadata::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Handler selector: the explicit type, else the routing capability.
    pub fn task_type(&self) -> Option<&str> {
        self.kind.as_deref().or(self.capability.as_deref())
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

// ============================================================================
// TASK RESULTS
// ============================================================================

/// Outcome of one task execution.
///
/// A successful result carries a payload and no error; a failed result
/// carries a non-empty error and no payload. The constructors are the only
/// way to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTaskResult")]
pub struct TaskResult {
    pub task_id: String,
    pub agent_id: String,
    success: bool,
    result: Option<Value>,
    error: Option<String>,
    pub execution_time_ms: u64,
    pub metadata: Metadata,
}

impl TaskResult {
    pub fn success(task_id: impl Into<String>, agent_id: impl Into<String>, result: Value) -> Self {
        Self {
            task_id: task_id.into(),
            agent_id: agent_id.into(),
            success: true,
            result: Some(result),
            error: None,
            execution_time_ms: 0,
            metadata: Metadata::new(),
        }
    }

    pub fn failure(
        task_id: impl Into<String>,
        agent_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            task_id: task_id.into(),
            agent_id: agent_id.into(),
            success: false,
            result: None,
            error: Some(error),
            execution_time_ms: 0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_execution_time(mut self, elapsed: Duration) -> Self {
        self.execution_time_ms = elapsed.as_millis() as u64;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Deserialize)]
struct RawTaskResult {
    task_id: String,
    agent_id: String,
    success: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    execution_time_ms: u64,
    #[serde(default)]
    metadata: Metadata,
}

impl TryFrom<RawTaskResult> for TaskResult {
    type Error = String;

    fn try_from(raw: RawTaskResult) -> Result<Self, Self::Error> {
        let base = match (raw.success, raw.result, raw.error) {
            (true, result, None) => TaskResult::success(raw.task_id, raw.agent_id, result),
            (false, Value::Null, Some(error)) if !error.trim().is_empty() => {
                TaskResult::failure(raw.task_id, raw.agent_id, error)
            }
            (true, _, _) => return Err("successful task result must have a result and no error".to_string()),
            (false, _, _) => return Err("failed task result must have an error and no result".to_string()),
        };
        Ok(Self {
            execution_time_ms: raw.execution_time_ms,
            metadata: raw.metadata,
            ..base
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
