//! Registry of standalone agents and their concurrent run loops.

use crate::agent::Agent;
use crate::bus::MessageBus;
use crate::message::Message;
use crate::runner::AgentRunner;
use indexmap::IndexMap;
use radar_core::AgentSettings;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Owns the agents of one process and the bus that connects them.
pub struct AgentRuntime {
    agents: IndexMap<String, Arc<dyn Agent>>,
    mailboxes: HashMap<String, mpsc::Receiver<Message>>,
    bus: MessageBus,
    settings: AgentSettings,
}

impl AgentRuntime {
    pub fn new(settings: AgentSettings) -> Self {
        Self {
            agents: IndexMap::new(),
            mailboxes: HashMap::new(),
            bus: MessageBus::new(),
            settings,
        }
    }

    /// Register an agent and open its mailbox on the bus.
    ///
    /// Registering the same id again replaces the agent and its mailbox.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        let agent_id = agent.id().to_string();
        let mailbox = self.bus.mailbox(agent_id.clone(), self.settings.mailbox_capacity);
        self.mailboxes.insert(agent_id.clone(), mailbox);
        self.agents.insert(agent_id.clone(), agent);
        tracing::info!(agent_id = %agent_id, "Registered agent");
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(agent_id).cloned()
    }

    /// Registered agent ids in registration order.
    pub fn list_agents(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn bus(&self) -> MessageBus {
        self.bus.clone()
    }

    /// Spawn one run loop per agent that has not been started yet.
    pub fn spawn_all(&mut self, cancel: &CancellationToken) -> JoinSet<String> {
        let mut tasks = JoinSet::new();
        for (agent_id, agent) in &self.agents {
            let Some(mailbox) = self.mailboxes.remove(agent_id) else {
                tracing::debug!(agent_id = %agent_id, "Agent already started");
                continue;
            };
            let runner = AgentRunner::new(Arc::clone(agent), mailbox, self.bus.clone(), &self.settings);
            let cancel = cancel.clone();
            let agent_id = agent_id.clone();
            tasks.spawn(async move {
                runner.run(cancel).await;
                agent_id
            });
        }
        tasks
    }

    /// Start every agent and wait until all loops have stopped.
    pub async fn run_all(&mut self, cancel: CancellationToken) {
        let mut tasks = self.spawn_all(&cancel);
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(agent_id) => tracing::info!(agent_id = %agent_id, "Agent loop exited"),
                Err(e) => tracing::error!(error = %e, "Agent loop panicked"),
            }
        }
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("agents", &self.list_agents())
            .field("settings", &self.settings)
            .finish()
    }
}
