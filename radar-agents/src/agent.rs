//! The agent contract and the state every agent carries.

use crate::message::{AgentCapability, AgentStatus, Message, Task, TaskResult};
use async_trait::async_trait;
use radar_core::RadarResult;
use std::sync::RwLock;

/// Identity, status and capability list shared by every agent.
///
/// Interior mutability lets agents be driven through `Arc<dyn Agent>` by the
/// run loop and the coordinator at the same time.
#[derive(Debug)]
pub struct AgentCore {
    id: String,
    name: String,
    status: RwLock<AgentStatus>,
    capabilities: RwLock<Vec<AgentCapability>>,
}

impl AgentCore {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: RwLock::new(AgentStatus::Idle),
            capabilities: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> AgentStatus {
        *self.status.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_status(&self, status: AgentStatus) {
        *self.status.write().unwrap_or_else(|e| e.into_inner()) = status;
    }

    pub fn capabilities(&self) -> Vec<AgentCapability> {
        self.capabilities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Add a capability, replacing any existing one with the same name.
    pub fn add_capability(&self, capability: AgentCapability) {
        let mut caps = self.capabilities.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(agent_id = %self.id, capability = %capability.name, "Added capability");
        match caps.iter_mut().find(|c| c.name == capability.name) {
            Some(existing) => *existing = capability,
            None => caps.push(capability),
        }
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|c| c.name == name)
    }
}

/// Contract implemented by every agent.
///
/// `process_message` and `execute_task` never fail: handler errors become an
/// ERROR reply or a failed [`TaskResult`].
#[async_trait]
pub trait Agent: Send + Sync {
    fn core(&self) -> &AgentCore;

    fn id(&self) -> &str {
        self.core().id()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn status(&self) -> AgentStatus {
        self.core().status()
    }

    /// Idempotent setup. Returns whether the agent is usable.
    async fn initialize(&self) -> bool;

    /// Handle one inbound message, producing at most one reply.
    async fn process_message(&self, message: Message) -> Option<Message>;

    /// Execute one task and report its outcome.
    async fn execute_task(&self, task: Task) -> TaskResult;

    fn capabilities(&self) -> Vec<AgentCapability> {
        self.core().capabilities()
    }

    /// Hook run by the standalone loop when the mailbox stays empty.
    async fn periodic_tasks(&self) -> RadarResult<()> {
        Ok(())
    }
}
