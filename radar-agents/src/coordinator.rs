//! Capability-routed workflow coordination.

use crate::agent::{Agent, AgentCore};
use crate::message::{content, AgentCapability, AgentStatus, Message, MessageType, Task, TaskResult};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use radar_core::{new_entity_id, AgentError, AgentSettings, RadarResult, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::Instrument;

/// Default id of the coordinator agent.
pub const COORDINATOR_ID: &str = "coordinator";

// ============================================================================
// REGISTRY
// ============================================================================

/// Bookkeeping for one registered agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub capabilities: Vec<AgentCapability>,
    pub status: AgentStatus,
    pub last_heartbeat: Timestamp,
}

impl RegistryEntry {
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.name == name)
    }
}

// ============================================================================
// WORKFLOWS
// ============================================================================

/// Lifecycle of a workflow. Only `Running` can transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
}

/// A sequence of capability-routed tasks and their results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workflow {
    pub id: String,
    pub tasks: Vec<Task>,
    /// Results keyed by task id, in execution order
    pub results: IndexMap<String, TaskResult>,
    status: WorkflowStatus,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub error: Option<String>,
}

impl Workflow {
    fn start(id: String, tasks: Vec<Task>) -> Self {
        Self {
            id,
            tasks,
            results: IndexMap::new(),
            status: WorkflowStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            error: None,
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status != WorkflowStatus::Running
    }

    fn complete(&mut self) {
        if self.status == WorkflowStatus::Running {
            self.status = WorkflowStatus::Completed;
            self.ended_at = Some(Utc::now());
        }
    }

    fn fail(&mut self, error: impl Into<String>) {
        if self.status == WorkflowStatus::Running {
            self.status = WorkflowStatus::Failed;
            self.error = Some(error.into());
            self.ended_at = Some(Utc::now());
        }
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Registers agents by capability and runs workflows across them.
///
/// Each workflow task is routed to the first idle agent, in registration
/// order, that advertises the task's capability. The task is executed on
/// that agent and the coordinator waits for its [`TaskResult`], bounded by
/// the task timeout. The first task that cannot be routed, times out, or
/// reports failure fails the workflow; later tasks are not attempted.
///
/// Agent status in the registry is only changed by registration and
/// [`CoordinatorAgent::set_agent_status`].
pub struct CoordinatorAgent {
    core: AgentCore,
    registry: RwLock<IndexMap<String, RegistryEntry>>,
    executors: RwLock<HashMap<String, Arc<dyn Agent>>>,
    workflows: RwLock<HashMap<String, Workflow>>,
    task_timeout: Duration,
}

impl CoordinatorAgent {
    pub fn new(settings: &AgentSettings) -> Self {
        Self::with_id(COORDINATOR_ID, settings)
    }

    pub fn with_id(agent_id: impl Into<String>, settings: &AgentSettings) -> Self {
        let core = AgentCore::new(agent_id, "Coordinator");
        core.add_capability(
            AgentCapability::new(
                "orchestrate_workflow",
                "Orchestrate complex workflows across multiple agents",
            )
            .with_input("workflow_id", "string")
            .with_input("tasks", "array")
            .with_output("workflow", "object"),
        );
        core.add_capability(
            AgentCapability::new("agent_registry", "Manage agent registration and discovery")
                .with_input("action", "string")
                .with_output("status", "string"),
        );
        Self {
            core,
            registry: RwLock::new(IndexMap::new()),
            executors: RwLock::new(HashMap::new()),
            workflows: RwLock::new(HashMap::new()),
            task_timeout: settings.task_timeout(),
        }
    }

    /// Insert or overwrite an agent's registry entry.
    ///
    /// The entry becomes idle with a fresh heartbeat. Capabilities are
    /// replaced, not merged; an agent keeps its original registration slot.
    pub async fn register_agent(&self, agent_id: &str, capabilities: Vec<AgentCapability>) {
        let entry = RegistryEntry {
            capabilities,
            status: AgentStatus::Idle,
            last_heartbeat: Utc::now(),
        };
        self.registry.write().await.insert(agent_id.to_string(), entry);
        tracing::info!(agent_id = %agent_id, "Registered agent");
    }

    /// Register an agent together with its executor so workflow tasks can be
    /// run on it directly.
    pub async fn attach_agent(&self, agent: Arc<dyn Agent>) {
        let agent_id = agent.id().to_string();
        self.register_agent(&agent_id, agent.capabilities()).await;
        self.executors.write().await.insert(agent_id, agent);
    }

    /// Remove an agent from the registry and drop its executor.
    pub async fn unregister_agent(&self, agent_id: &str) -> bool {
        self.executors.write().await.remove(agent_id);
        self.registry.write().await.shift_remove(agent_id).is_some()
    }

    /// First idle agent, in registration order, advertising `capability`.
    pub async fn find_capable_agent(&self, capability: &str) -> Option<String> {
        self.registry
            .read()
            .await
            .iter()
            .find(|(_, entry)| entry.status == AgentStatus::Idle && entry.has_capability(capability))
            .map(|(agent_id, _)| agent_id.clone())
    }

    pub async fn set_agent_status(&self, agent_id: &str, status: AgentStatus) -> RadarResult<()> {
        let mut registry = self.registry.write().await;
        let entry = registry.get_mut(agent_id).ok_or_else(|| AgentError::NotRegistered {
            agent_id: agent_id.to_string(),
        })?;
        entry.status = status;
        Ok(())
    }

    pub async fn heartbeat(&self, agent_id: &str) -> RadarResult<()> {
        let mut registry = self.registry.write().await;
        let entry = registry.get_mut(agent_id).ok_or_else(|| AgentError::NotRegistered {
            agent_id: agent_id.to_string(),
        })?;
        entry.last_heartbeat = Utc::now();
        Ok(())
    }

    pub async fn registry_entry(&self, agent_id: &str) -> Option<RegistryEntry> {
        self.registry.read().await.get(agent_id).cloned()
    }

    /// Registered agents in registration order.
    pub async fn registered_agents(&self) -> Vec<(String, RegistryEntry)> {
        self.registry
            .read()
            .await
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    /// Latest published state of a workflow.
    pub async fn workflow(&self, workflow_id: &str) -> Option<Workflow> {
        self.workflows.read().await.get(workflow_id).cloned()
    }

    pub async fn workflows(&self) -> Vec<Workflow> {
        self.workflows.read().await.values().cloned().collect()
    }

    /// Run `tasks` in order and return the finished workflow.
    pub async fn orchestrate_workflow(&self, workflow_id: &str, tasks: Vec<Task>) -> Workflow {
        let span = tracing::info_span!("workflow", workflow_id = %workflow_id);
        async move {
            tracing::info!(tasks = tasks.len(), "Starting workflow");
            let mut workflow = Workflow::start(workflow_id.to_string(), tasks.clone());
            self.publish(&workflow).await;

            match self.run_tasks(&mut workflow, &tasks).await {
                Ok(()) => {
                    workflow.complete();
                    tracing::info!("Workflow completed");
                }
                Err(err) => {
                    tracing::error!(error = %err, "Workflow failed");
                    workflow.fail(err.to_string());
                }
            }

            self.publish(&workflow).await;
            workflow
        }
        .instrument(span)
        .await
    }

    async fn run_tasks(&self, workflow: &mut Workflow, tasks: &[Task]) -> Result<(), AgentError> {
        for task in tasks {
            let capability = task.capability.as_deref().ok_or_else(|| AgentError::InvalidMessage {
                reason: format!("Task {} declares no capability", task.id),
            })?;
            let agent_id = self.find_capable_agent(capability).await.ok_or_else(|| {
                AgentError::NoCapableAgent {
                    capability: capability.to_string(),
                }
            })?;

            let result = self.dispatch(&agent_id, task.clone()).await?;
            let failure = (!result.is_success())
                .then(|| result.error().unwrap_or("unknown error").to_string());
            workflow.results.insert(task.id.clone(), result);
            self.publish(workflow).await;

            if let Some(reason) = failure {
                return Err(AgentError::TaskFailed {
                    task_id: task.id.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    async fn dispatch(&self, agent_id: &str, task: Task) -> Result<TaskResult, AgentError> {
        let executor = self
            .executors
            .read()
            .await
            .get(agent_id)
            .cloned()
            .ok_or_else(|| AgentError::NoExecutor {
                agent_id: agent_id.to_string(),
            })?;

        let task_id = task.id.clone();
        tracing::debug!(task_id = %task_id, agent_id = %agent_id, "Dispatching task");

        let started = Instant::now();
        let mut handle = tokio::spawn(async move { executor.execute_task(task).await });
        let result = match tokio::time::timeout(self.task_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                return Err(AgentError::HandlerPanicked {
                    agent_id: agent_id.to_string(),
                    reason: join_err.to_string(),
                })
            }
            Err(_) => {
                handle.abort();
                return Err(AgentError::TaskTimeout {
                    task_id,
                    timeout_ms: self.task_timeout.as_millis() as u64,
                });
            }
        };

        if result.execution_time_ms == 0 {
            return Ok(result.with_execution_time(started.elapsed()));
        }
        Ok(result)
    }

    async fn publish(&self, workflow: &Workflow) {
        self.workflows
            .write()
            .await
            .insert(workflow.id.clone(), workflow.clone());
    }

    fn parse_tasks(value: Option<&Value>) -> Result<Vec<Task>, AgentError> {
        match value {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| AgentError::InvalidMessage {
                reason: format!("invalid tasks: {}", e),
            }),
        }
    }

    async fn handle_register(&self, message: &Message) -> Result<Message, AgentError> {
        let capabilities: Vec<AgentCapability> = match message.content.get("capabilities") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                AgentError::InvalidMessage {
                    reason: format!("invalid capabilities: {}", e),
                }
            })?,
        };
        self.register_agent(&message.sender, capabilities).await;
        Ok(message.reply(
            self.id(),
            MessageType::Response,
            content([("status", json!("registered"))]),
        ))
    }

    async fn handle_start_workflow(&self, message: &Message) -> Result<Message, AgentError> {
        let workflow_id = message
            .content
            .get("workflow_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| new_entity_id().to_string());
        let tasks = Self::parse_tasks(message.content.get("tasks"))?;
        let workflow = self.orchestrate_workflow(&workflow_id, tasks).await;
        Ok(message.reply(
            self.id(),
            MessageType::Response,
            content([("workflow", serde_json::to_value(&workflow).unwrap_or(Value::Null))]),
        ))
    }
}

#[async_trait]
impl Agent for CoordinatorAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn initialize(&self) -> bool {
        tracing::info!(agent_id = %self.id(), "Initializing coordinator agent");
        true
    }

    async fn process_message(&self, message: Message) -> Option<Message> {
        let outcome = match message.action() {
            Some("register") => self.handle_register(&message).await,
            Some("start_workflow") => self.handle_start_workflow(&message).await,
            _ => return None,
        };
        Some(outcome.unwrap_or_else(|err| message.error_reply(self.id(), err)))
    }

    async fn execute_task(&self, task: Task) -> TaskResult {
        let started = Instant::now();
        match task.task_type() {
            Some("orchestrate") | Some("orchestrate_workflow") => {
                let workflow_id = task
                    .str_param("workflow_id")
                    .map(str::to_string)
                    .unwrap_or_else(|| new_entity_id().to_string());
                let tasks = match Self::parse_tasks(task.param("tasks")) {
                    Ok(tasks) => tasks,
                    Err(err) => {
                        return TaskResult::failure(task.id, self.id(), err.to_string())
                            .with_execution_time(started.elapsed())
                    }
                };
                let workflow = self.orchestrate_workflow(&workflow_id, tasks).await;
                let status = workflow.status();
                TaskResult::success(
                    task.id,
                    self.id(),
                    serde_json::to_value(&workflow).unwrap_or(Value::Null),
                )
                .with_execution_time(started.elapsed())
                .with_metadata("workflow_status", json!(status))
            }
            other => {
                let reason = format!("Unknown task type: {}", other.unwrap_or("none"));
                TaskResult::failure(task.id, self.id(), reason).with_execution_time(started.elapsed())
            }
        }
    }
}

impl std::fmt::Debug for CoordinatorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorAgent")
            .field("id", &self.core.id())
            .field("task_timeout", &self.task_timeout)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::Metadata;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Executes tasks by echoing params; fails when `fail` is set.
    struct Worker {
        core: AgentCore,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl Worker {
        fn new(id: &str, capabilities: &[&str]) -> Arc<Self> {
            Self::with_delay(id, capabilities, Duration::ZERO)
        }

        fn with_delay(id: &str, capabilities: &[&str], delay: Duration) -> Arc<Self> {
            let core = AgentCore::new(id, id);
            for name in capabilities {
                core.add_capability(AgentCapability::new(*name, "test capability"));
            }
            Arc::new(Self {
                core,
                calls: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl Agent for Worker {
        fn core(&self) -> &AgentCore {
            &self.core
        }

        async fn initialize(&self) -> bool {
            true
        }

        async fn process_message(&self, _message: Message) -> Option<Message> {
            None
        }

        async fn execute_task(&self, task: Task) -> TaskResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if task.param("fail").is_some() {
                return TaskResult::failure(task.id, self.id(), "worker refused");
            }
            TaskResult::success(task.id, self.id(), json!({"handled_by": self.id()}))
        }
    }

    fn coordinator() -> CoordinatorAgent {
        CoordinatorAgent::new(&AgentSettings::default())
    }

    fn task(id: &str, capability: &str) -> Task {
        Task::new(id).with_capability(capability)
    }

    // ========================================================================
    // Registry
    // ========================================================================

    #[tokio::test]
    async fn test_find_capable_agent_first_registered_wins() {
        let coord = coordinator();
        coord
            .register_agent("a", vec![AgentCapability::new("chat", "")])
            .await;
        coord
            .register_agent("b", vec![AgentCapability::new("chat", "")])
            .await;
        assert_eq!(coord.find_capable_agent("chat").await.as_deref(), Some("a"));
        assert_eq!(coord.find_capable_agent("analyze_text").await, None);
    }

    #[tokio::test]
    async fn test_find_capable_agent_skips_non_idle() {
        let coord = coordinator();
        coord
            .register_agent("a", vec![AgentCapability::new("chat", "")])
            .await;
        coord
            .register_agent("b", vec![AgentCapability::new("chat", "")])
            .await;
        coord.set_agent_status("a", AgentStatus::Busy).await.unwrap();
        assert_eq!(coord.find_capable_agent("chat").await.as_deref(), Some("b"));
        coord.set_agent_status("b", AgentStatus::Offline).await.unwrap();
        assert_eq!(coord.find_capable_agent("chat").await, None);
    }

    #[tokio::test]
    async fn test_reregistration_replaces_capabilities() {
        let coord = coordinator();
        coord
            .register_agent("a", vec![AgentCapability::new("chat", "")])
            .await;
        coord
            .register_agent("b", vec![AgentCapability::new("chat", "")])
            .await;
        coord.set_agent_status("a", AgentStatus::Error).await.unwrap();
        coord
            .register_agent("a", vec![AgentCapability::new("analyze_text", "")])
            .await;

        let agents = coord.registered_agents().await;
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].0, "a");
        assert_eq!(agents[0].1.capabilities.len(), 1);
        assert_eq!(agents[0].1.status, AgentStatus::Idle);
        assert_eq!(coord.find_capable_agent("chat").await.as_deref(), Some("b"));
        assert_eq!(
            coord.find_capable_agent("analyze_text").await.as_deref(),
            Some("a")
        );
    }

    #[tokio::test]
    async fn test_status_of_unknown_agent() {
        let coord = coordinator();
        let err = coord
            .set_agent_status("ghost", AgentStatus::Idle)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert!(coord.heartbeat("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_heartbeat_advances() {
        let coord = coordinator();
        coord.register_agent("a", vec![]).await;
        let before = coord.registry_entry("a").await.unwrap().last_heartbeat;
        tokio::time::sleep(Duration::from_millis(2)).await;
        coord.heartbeat("a").await.unwrap();
        let after = coord.registry_entry("a").await.unwrap().last_heartbeat;
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_unregister_agent() {
        let coord = coordinator();
        coord.attach_agent(Worker::new("a", &["chat"])).await;
        assert!(coord.unregister_agent("a").await);
        assert_eq!(coord.find_capable_agent("chat").await, None);
        assert!(!coord.unregister_agent("a").await);
    }

    // ========================================================================
    // Workflows
    // ========================================================================

    #[tokio::test]
    async fn test_workflow_collects_results_in_order() {
        let coord = coordinator();
        coord.attach_agent(Worker::new("reader", &["extract"])).await;
        coord.attach_agent(Worker::new("analyst", &["analyze"])).await;

        let workflow = coord
            .orchestrate_workflow(
                "wf-1",
                vec![task("t1", "extract"), task("t2", "analyze")],
            )
            .await;

        assert_eq!(workflow.status(), WorkflowStatus::Completed);
        assert!(workflow.ended_at.is_some());
        assert!(workflow.error.is_none());
        let keys: Vec<_> = workflow.results.keys().cloned().collect();
        assert_eq!(keys, vec!["t1", "t2"]);
        assert_eq!(workflow.results["t1"].agent_id, "reader");
        assert_eq!(
            workflow.results["t2"].result(),
            Some(&json!({"handled_by": "analyst"}))
        );
        assert_eq!(coord.workflow("wf-1").await, Some(workflow));
    }

    #[tokio::test]
    async fn test_missing_capability_fails_fast() {
        let coord = coordinator();
        let worker = Worker::new("reader", &["extract"]);
        coord.attach_agent(worker.clone()).await;

        let workflow = coord
            .orchestrate_workflow(
                "wf-2",
                vec![
                    task("t1", "extract"),
                    task("t2", "detect_anomalies"),
                    task("t3", "extract"),
                ],
            )
            .await;

        assert_eq!(workflow.status(), WorkflowStatus::Failed);
        assert!(workflow.error.as_deref().unwrap().contains("detect_anomalies"));
        assert_eq!(workflow.results.len(), 1);
        assert_eq!(worker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_task_result_fails_workflow() {
        let coord = coordinator();
        let worker = Worker::new("reader", &["extract"]);
        coord.attach_agent(worker.clone()).await;

        let workflow = coord
            .orchestrate_workflow(
                "wf-3",
                vec![
                    task("t1", "extract").with_param("fail", json!(true)),
                    task("t2", "extract"),
                ],
            )
            .await;

        assert_eq!(workflow.status(), WorkflowStatus::Failed);
        assert!(workflow.error.as_deref().unwrap().contains("worker refused"));
        assert!(!workflow.results["t1"].is_success());
        assert_eq!(worker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registered_without_executor_fails() {
        let coord = coordinator();
        coord
            .register_agent("remote", vec![AgentCapability::new("extract", "")])
            .await;
        let workflow = coord
            .orchestrate_workflow("wf-4", vec![task("t1", "extract")])
            .await;
        assert_eq!(workflow.status(), WorkflowStatus::Failed);
        assert!(workflow.error.as_deref().unwrap().contains("no task executor"));
    }

    #[tokio::test]
    async fn test_task_without_capability_fails() {
        let coord = coordinator();
        let workflow = coord
            .orchestrate_workflow("wf-5", vec![Task::new("t1").with_kind("chat")])
            .await;
        assert_eq!(workflow.status(), WorkflowStatus::Failed);
        assert!(workflow.error.as_deref().unwrap().contains("no capability"));
    }

    #[tokio::test]
    async fn test_task_timeout_fails_workflow() {
        let settings = AgentSettings {
            task_timeout_ms: 20,
            ..AgentSettings::default()
        };
        let coord = CoordinatorAgent::new(&settings);
        coord
            .attach_agent(Worker::with_delay("slow", &["extract"], Duration::from_secs(5)))
            .await;
        let workflow = coord
            .orchestrate_workflow("wf-6", vec![task("t1", "extract")])
            .await;
        assert_eq!(workflow.status(), WorkflowStatus::Failed);
        assert!(workflow.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_workflow_completes() {
        let coord = coordinator();
        let workflow = coord.orchestrate_workflow("wf-7", vec![]).await;
        assert_eq!(workflow.status(), WorkflowStatus::Completed);
        assert!(workflow.results.is_empty());
    }

    #[test]
    fn test_workflow_status_is_monotonic() {
        let mut workflow = Workflow::start("wf".to_string(), vec![]);
        workflow.fail("boom");
        workflow.complete();
        assert_eq!(workflow.status(), WorkflowStatus::Failed);
        assert_eq!(workflow.error.as_deref(), Some("boom"));

        let mut workflow = Workflow::start("wf".to_string(), vec![]);
        workflow.complete();
        workflow.fail("late");
        assert_eq!(workflow.status(), WorkflowStatus::Completed);
        assert!(workflow.error.is_none());
    }

    #[test]
    fn test_workflow_serializes_status() {
        let workflow = Workflow::start("wf".to_string(), vec![]);
        let value = serde_json::to_value(&workflow).unwrap();
        assert_eq!(value["status"], "running");
        assert_eq!(value["id"], "wf");
    }

    // ========================================================================
    // Messages and tasks
    // ========================================================================

    #[tokio::test]
    async fn test_register_message() {
        let coord = coordinator();
        let request = Message::request(
            "analyst",
            COORDINATOR_ID,
            content([
                ("action", json!("register")),
                (
                    "capabilities",
                    json!([{"name": "analyze_text", "description": "Analyze text"}]),
                ),
            ]),
        );
        let reply = coord.process_message(request.clone()).await.unwrap();
        assert_eq!(reply.message_type, MessageType::Response);
        assert_eq!(reply.content["status"], json!("registered"));
        assert!(reply.is_reply_to(&request));
        assert_eq!(
            coord.find_capable_agent("analyze_text").await.as_deref(),
            Some("analyst")
        );
    }

    #[tokio::test]
    async fn test_register_message_with_bad_capabilities() {
        let coord = coordinator();
        let request = Message::request(
            "analyst",
            COORDINATOR_ID,
            content([("action", json!("register")), ("capabilities", json!("chat"))]),
        );
        let reply = coord.process_message(request).await.unwrap();
        assert_eq!(reply.message_type, MessageType::Error);
        assert!(reply.content["error"]
            .as_str()
            .unwrap()
            .contains("invalid capabilities"));
    }

    #[tokio::test]
    async fn test_start_workflow_message() {
        let coord = coordinator();
        coord.attach_agent(Worker::new("reader", &["extract"])).await;
        let request = Message::request(
            "api",
            COORDINATOR_ID,
            content([
                ("action", json!("start_workflow")),
                ("workflow_id", json!("wf-msg")),
                ("tasks", json!([{"id": "t1", "capability": "extract"}])),
            ]),
        );
        let reply = coord.process_message(request).await.unwrap();
        assert_eq!(reply.content["workflow"]["status"], json!("completed"));
        assert_eq!(reply.content["workflow"]["id"], json!("wf-msg"));
    }

    #[tokio::test]
    async fn test_unknown_action_yields_no_reply() {
        let coord = coordinator();
        let request = Message::request("api", COORDINATOR_ID, Metadata::new());
        assert!(coord.process_message(request).await.is_none());
    }

    #[tokio::test]
    async fn test_execute_orchestrate_task() {
        let coord = coordinator();
        let result = coord
            .execute_task(
                Task::new("outer")
                    .with_kind("orchestrate")
                    .with_param("workflow_id", json!("wf-task"))
                    .with_param("tasks", json!([{"id": "t1", "capability": "missing"}])),
            )
            .await;
        assert!(result.is_success());
        assert_eq!(result.result().unwrap()["status"], json!("failed"));
        assert_eq!(result.metadata["workflow_status"], json!("failed"));
    }

    #[tokio::test]
    async fn test_execute_unknown_task_type() {
        let coord = coordinator();
        let result = coord.execute_task(Task::new("t").with_kind("dance")).await;
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("Unknown task type: dance"));
        assert_eq!(result.task_id, "t");

        let result = coord.execute_task(Task::new("untyped")).await;
        assert_eq!(result.error(), Some("Unknown task type: none"));
        assert_eq!(result.task_id, "untyped");
    }

    #[test]
    fn test_coordinator_capabilities() {
        let coord = coordinator();
        let names: Vec<_> = coord.capabilities().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["orchestrate_workflow", "agent_registry"]);
    }
}
