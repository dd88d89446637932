//! Task specification, allocation, and lifecycle records.

use crate::{AgentId, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default parallelism degree when parallel execution is requested without one.
pub const DEFAULT_PARALLELISM: usize = 2;

/// A task specification, immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique task identifier (generated when the caller supplies none).
    pub id: TaskId,

    /// Type of work this task represents.
    pub task_type: String,

    /// Capability tags an agent must cover to be eligible.
    pub required_capabilities: HashSet<String>,

    /// Priority on a 1-10 scale. Carried as metadata; not used in scoring.
    pub priority: u8,

    /// Optional deadline. Informational only; never enforced.
    pub deadline: Option<DateTime<Utc>>,

    /// Whether the task may be allocated to multiple agents at once.
    pub parallel_execution: bool,

    /// Number of agents to allocate when executing in parallel.
    pub parallelism: usize,
}

impl TaskSpec {
    /// Create a new TaskSpec with a generated ID and default priority 5.
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            id: TaskId::generate(),
            task_type: task_type.into(),
            required_capabilities: HashSet::new(),
            priority: 5,
            deadline: None,
            parallel_execution: false,
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Builder method to add a required capability.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.required_capabilities.insert(capability.into());
        self
    }

    /// Builder method to set the priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Builder method to set the deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builder method to request parallel execution across `parallelism` agents.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallel_execution = true;
        self.parallelism = parallelism;
        self
    }
}

/// Strategy used when binding a task to agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationType {
    /// The single top-scoring agent was selected.
    Single,
    /// The top N agents were selected to work concurrently.
    Parallel,
}

/// The record binding a task to its selected agents.
///
/// Created exactly once per task and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Task this allocation belongs to.
    pub task_id: TaskId,

    /// Strategy used for this allocation.
    pub allocation_type: AllocationType,

    /// Selected agents, ordered by descending suitability score.
    pub agents: Vec<AgentId>,

    /// When the allocation was made.
    pub allocated_at: DateTime<Utc>,

    /// Priority copied from the task spec.
    pub priority: u8,
}

/// A task currently owned by the coordinator's active set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTask {
    /// The submitted specification.
    pub spec: TaskSpec,

    /// The allocation binding this task to its agents.
    pub allocation: Allocation,

    /// When the task entered the active set.
    pub started_at: DateTime<Utc>,

    /// Current lifecycle status.
    pub status: TaskStatus,

    /// Progress percentage, 0.0 to 100.0.
    pub progress: f64,

    /// Result payload attached by a status update, if any.
    pub result: Option<serde_json::Value>,

    /// Last time this record was mutated.
    pub last_updated: DateTime<Utc>,
}

impl ActiveTask {
    /// Create a freshly allocated task record.
    pub fn new(spec: TaskSpec, allocation: Allocation) -> Self {
        let now = Utc::now();
        Self {
            spec,
            allocation,
            started_at: now,
            status: TaskStatus::Allocated,
            progress: 0.0,
            result: None,
            last_updated: now,
        }
    }

    /// Convert into an archived record at a terminal transition.
    pub fn into_archived(
        self,
        status: TaskStatus,
        finished_at: DateTime<Utc>,
        cancelled: bool,
    ) -> ArchivedTask {
        let duration_secs = (finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0;
        ArchivedTask {
            spec: self.spec,
            allocation: self.allocation,
            started_at: self.started_at,
            finished_at,
            duration_secs,
            status,
            progress: self.progress,
            result: self.result,
            cancelled,
        }
    }
}

/// A task that reached a terminal status and was moved to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedTask {
    /// The submitted specification.
    pub spec: TaskSpec,

    /// The allocation this task ran under.
    pub allocation: Allocation,

    /// When the task entered the active set.
    pub started_at: DateTime<Utc>,

    /// When the terminal transition happened.
    pub finished_at: DateTime<Utc>,

    /// Wall-clock duration from allocation to terminal transition.
    pub duration_secs: f64,

    /// Terminal status (Completed or Failed).
    pub status: TaskStatus,

    /// Progress at the time of the terminal transition.
    pub progress: f64,

    /// Result payload, if one was attached.
    pub result: Option<serde_json::Value>,

    /// True when the failure came from an explicit cancellation.
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = TaskSpec::new("analysis")
            .with_capability("nlp")
            .with_priority(8)
            .with_parallelism(3);

        assert_eq!(spec.task_type, "analysis");
        assert!(spec.required_capabilities.contains("nlp"));
        assert_eq!(spec.priority, 8);
        assert!(spec.parallel_execution);
        assert_eq!(spec.parallelism, 3);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = TaskSpec::new("t");
        let b = TaskSpec::new("t");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_into_archived_duration() {
        let spec = TaskSpec::new("t");
        let allocation = Allocation {
            task_id: spec.id.clone(),
            allocation_type: AllocationType::Single,
            agents: vec![AgentId::new("a1")],
            allocated_at: Utc::now(),
            priority: 5,
        };
        let task = ActiveTask::new(spec, allocation);
        let finished = task.started_at + chrono::Duration::milliseconds(2500);
        let archived = task.into_archived(TaskStatus::Completed, finished, false);

        assert_eq!(archived.status, TaskStatus::Completed);
        assert!((archived.duration_secs - 2.5).abs() < 1e-9);
        assert!(!archived.cancelled);
    }
}
