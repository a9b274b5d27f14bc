//! Mairie Radar Agents - Agent Communication Layer
//!
//! Message-passing agents for the platform:
//! - Message, capability, task and task-result value types
//! - The `Agent` contract and the standalone run loop
//! - An in-process message bus and agent runtime
//! - `CoordinatorAgent`, which routes workflow tasks by capability
//! - `AssistantAgent`, which answers chat and analysis requests

pub mod agent;
pub mod assistant;
pub mod bus;
pub mod coordinator;
pub mod message;
pub mod runner;
pub mod runtime;

pub use agent::{Agent, AgentCore};
pub use assistant::{
    chat_confidence, extract_insights, AnalysisType, AssistantAgent, ChatReply, TextAnalysis,
    ASSISTANT_ID,
};
pub use bus::MessageBus;
pub use coordinator::{
    CoordinatorAgent, RegistryEntry, Workflow, WorkflowStatus, COORDINATOR_ID,
};
pub use message::{
    content, AgentCapability, AgentStatus, Message, MessageType, Task, TaskResult,
};
pub use runner::AgentRunner;
pub use runtime::AgentRuntime;
