//! Standalone agent run loop.

use crate::agent::Agent;
use crate::bus::MessageBus;
use crate::message::{AgentStatus, Message};
use radar_core::{AgentError, AgentSettings, RadarResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Drives one agent from its mailbox until cancelled.
pub struct AgentRunner {
    agent: Arc<dyn Agent>,
    mailbox: mpsc::Receiver<Message>,
    bus: MessageBus,
    receive_timeout: Duration,
    error_backoff: Duration,
}

impl AgentRunner {
    pub fn new(
        agent: Arc<dyn Agent>,
        mailbox: mpsc::Receiver<Message>,
        bus: MessageBus,
        settings: &AgentSettings,
    ) -> Self {
        Self {
            agent,
            mailbox,
            bus,
            receive_timeout: settings.receive_timeout(),
            error_backoff: settings.error_backoff(),
        }
    }

    /// Run the receive / dispatch / respond cycle.
    ///
    /// Each iteration waits up to the receive timeout for a message. A
    /// message is processed and any reply routed back to its sender; a
    /// timeout runs the agent's periodic tasks. A failed iteration puts the
    /// agent in `Error` and pauses for the backoff before resuming.
    /// Cancellation is observed between iterations, never while a message is
    /// being handled. The loop also ends if the mailbox is closed.
    pub async fn run(mut self, cancel: CancellationToken) {
        let agent_id = self.agent.id().to_string();
        tracing::info!(agent_id = %agent_id, name = %self.agent.name(), "Starting agent");

        if !self.agent.initialize().await {
            tracing::warn!(agent_id = %agent_id, "Agent initialization reported failure");
        }

        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = tokio::time::timeout(self.receive_timeout, self.mailbox.recv()) => received,
            };

            let outcome = match received {
                Ok(Some(message)) => self.handle(message).await,
                Ok(None) => {
                    tracing::info!(agent_id = %agent_id, "Mailbox closed");
                    break;
                }
                Err(_) => self.agent.periodic_tasks().await,
            };

            if let Err(err) = outcome {
                tracing::error!(agent_id = %agent_id, error = %err, "Error in agent loop");
                self.agent.core().set_status(AgentStatus::Error);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.error_backoff) => {}
                }
            }
        }

        self.agent.core().set_status(AgentStatus::Offline);
        tracing::info!(agent_id = %agent_id, "Agent stopped");
    }

    async fn handle(&self, message: Message) -> RadarResult<()> {
        tracing::info!(
            agent_id = %self.agent.id(),
            message_id = %message.id,
            sender = %message.sender,
            "Received message"
        );
        self.agent.core().set_status(AgentStatus::Busy);

        // Run the handler on its own task so a panic surfaces as an error
        // instead of tearing down the loop.
        let agent = Arc::clone(&self.agent);
        let reply = tokio::spawn(async move { agent.process_message(message).await })
            .await
            .map_err(|e| AgentError::HandlerPanicked {
                agent_id: self.agent.id().to_string(),
                reason: e.to_string(),
            })?;

        if let Some(reply) = reply {
            self.bus.send(reply).await?;
        }

        self.agent.core().set_status(AgentStatus::Idle);
        Ok(())
    }
}
