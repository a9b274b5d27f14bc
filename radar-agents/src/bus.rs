//! In-process message routing between agent mailboxes.

use crate::message::Message;
use radar_core::{AgentError, RadarResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Routing table from agent id to mailbox sender.
///
/// Cloning the bus is cheap; all clones share one table.
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    routes: Arc<RwLock<HashMap<String, mpsc::Sender<Message>>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mailbox for `agent_id` and route its messages there.
    ///
    /// A second call for the same id replaces the previous route.
    pub fn mailbox(&self, agent_id: impl Into<String>, capacity: usize) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(agent_id.into(), tx);
        rx
    }

    pub fn unregister(&self, agent_id: &str) -> bool {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(agent_id)
            .is_some()
    }

    pub fn is_registered(&self, agent_id: &str) -> bool {
        self.routes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(agent_id)
    }

    /// Deliver a message to its receiver's mailbox.
    pub async fn send(&self, message: Message) -> RadarResult<()> {
        let sender = {
            let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
            routes.get(&message.receiver).cloned()
        };
        let receiver = message.receiver.clone();
        let sender = sender.ok_or_else(|| AgentError::UnknownRecipient {
            agent_id: receiver.clone(),
        })?;

        tracing::debug!(
            message_id = %message.id,
            sender = %message.sender,
            receiver = %receiver,
            "Sending message"
        );
        sender
            .send(message)
            .await
            .map_err(|_| AgentError::MailboxClosed { agent_id: receiver }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::{Metadata, RadarError};

    #[tokio::test]
    async fn test_send_delivers_to_mailbox() {
        let bus = MessageBus::new();
        let mut inbox = bus.mailbox("assistant", 4);
        let msg = Message::request("api", "assistant", Metadata::new());
        bus.send(msg.clone()).await.unwrap();
        assert_eq!(inbox.recv().await, Some(msg));
    }

    #[tokio::test]
    async fn test_send_to_unknown_recipient() {
        let bus = MessageBus::new();
        let err = bus
            .send(Message::request("api", "nobody", Metadata::new()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RadarError::Agent(AgentError::UnknownRecipient {
                agent_id: "nobody".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_send_to_closed_mailbox() {
        let bus = MessageBus::new();
        drop(bus.mailbox("assistant", 1));
        let err = bus
            .send(Message::request("api", "assistant", Metadata::new()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RadarError::Agent(AgentError::MailboxClosed { .. })
        ));
    }

    #[test]
    fn test_unregister() {
        let bus = MessageBus::new();
        let _inbox = bus.mailbox("a", 1);
        assert!(bus.is_registered("a"));
        assert!(bus.unregister("a"));
        assert!(!bus.is_registered("a"));
        assert!(!bus.unregister("a"));
    }
}
