//! Shared coordinator state.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use taskhive_core::{
    ActiveTask, AgentCounts, AgentId, AgentRecord, ArchivedTask, PerformanceSummary,
    SystemMetrics, SystemStatus, TaskCounts, TaskId,
};

use crate::config::CoordinatorConfig;
use crate::sink::ObservabilitySink;

/// Mutable coordinator state, guarded by a single lock so that allocation
/// and terminal transitions mutate the registry and task stores atomically.
#[derive(Default)]
pub(crate) struct CoordinatorState {
    /// Registered agents indexed by AgentId.
    pub agents: HashMap<AgentId, AgentRecord>,

    /// Active tasks indexed by TaskId.
    pub active: HashMap<TaskId, ActiveTask>,

    /// Archived tasks, newest at the back. Capped ring.
    pub history: VecDeque<ArchivedTask>,

    /// Process-wide aggregate metrics.
    pub metrics: SystemMetrics,
}

/// The task-dispatch coordinator.
///
/// Owns the agent registry, the active task set, the task history, and the
/// system metrics. All operations take `&self`; internal synchronization
/// makes concurrent `allocate_task`/`update_task_status` calls safe.
pub struct Coordinator {
    pub(crate) config: CoordinatorConfig,
    pub(crate) inner: RwLock<CoordinatorState>,
    pub(crate) sink: Option<Arc<dyn ObservabilitySink>>,

    /// Opaque sink entity IDs keyed by domain key ("agent:x", "task:y").
    /// Kept outside the main lock: sink bookkeeping is best-effort and must
    /// never contend with allocation or lifecycle paths.
    pub(crate) entity_ids: tokio::sync::Mutex<HashMap<String, String>>,
}

impl Coordinator {
    /// Create a new Coordinator with default configuration.
    pub fn new() -> Arc<Self> {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Create a new Coordinator with the given configuration.
    pub fn with_config(config: CoordinatorConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            inner: RwLock::new(CoordinatorState::default()),
            sink: None,
            entity_ids: tokio::sync::Mutex::new(HashMap::new()),
        })
    }

    /// Create a new Coordinator that reports to an observability sink.
    ///
    /// Sink failures are logged and never surfaced to callers.
    pub fn with_sink(config: CoordinatorConfig, sink: Arc<dyn ObservabilitySink>) -> Arc<Self> {
        Arc::new(Self {
            config,
            inner: RwLock::new(CoordinatorState::default()),
            sink: Some(sink),
            entity_ids: tokio::sync::Mutex::new(HashMap::new()),
        })
    }

    /// Number of registered agents.
    pub async fn agent_count(&self) -> usize {
        self.inner.read().await.agents.len()
    }

    /// Number of tasks currently in the active set.
    pub async fn active_task_count(&self) -> usize {
        self.inner.read().await.active.len()
    }

    /// Point-in-time summary of agents, tasks, and performance.
    pub async fn system_status(&self) -> SystemStatus {
        let state = self.inner.read().await;

        let active_agents = state
            .agents
            .values()
            .filter(|a| a.status.is_active())
            .count();

        SystemStatus {
            timestamp: Utc::now(),
            agents: AgentCounts {
                total: state.agents.len(),
                active: active_agents,
                inactive: state.agents.len() - active_agents,
            },
            tasks: TaskCounts {
                active: state.active.len(),
                completed: state.metrics.tasks_completed,
                failed: state.metrics.tasks_failed,
                success_rate: state.metrics.success_rate(),
            },
            performance: PerformanceSummary {
                average_completion_time_secs: state.metrics.average_completion_time_secs,
            },
        }
    }
}
