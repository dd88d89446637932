//! Agent registry record and per-agent performance metrics.

use crate::{AgentId, AgentStatus, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A registered worker agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Unique agent identifier (caller-supplied).
    pub id: AgentId,

    /// Type/role of the agent (free-form tag).
    pub agent_type: String,

    /// Capability tags this agent advertises.
    pub capabilities: HashSet<String>,

    /// Optional communication endpoint.
    pub endpoint: Option<String>,

    /// Current availability status.
    pub status: AgentStatus,

    /// When the agent was registered.
    pub registered_at: DateTime<Utc>,

    /// Last time the agent was assigned work or changed status.
    pub last_activity: DateTime<Utc>,

    /// Tasks currently allocated to this agent, in allocation order.
    ///
    /// Invariant: contains only task IDs that are still in the active set.
    pub assigned_tasks: Vec<TaskId>,

    /// Performance metrics derived from terminal task outcomes.
    pub metrics: AgentMetrics,
}

impl AgentRecord {
    /// Create a new AgentRecord with default metrics.
    pub fn new(id: AgentId, agent_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            agent_type: agent_type.into(),
            capabilities: HashSet::new(),
            endpoint: None,
            status: AgentStatus::Active,
            registered_at: now,
            last_activity: now,
            assigned_tasks: Vec::new(),
            metrics: AgentMetrics::default(),
        }
    }

    /// Builder method to add a capability tag.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Builder method to set the capability set.
    pub fn with_capabilities(mut self, capabilities: HashSet<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Builder method to set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Check whether this agent covers every required capability.
    ///
    /// An empty requirement set matches any agent.
    pub fn has_capabilities(&self, required: &HashSet<String>) -> bool {
        required.is_subset(&self.capabilities)
    }

    /// Number of currently assigned tasks.
    pub fn load(&self) -> usize {
        self.assigned_tasks.len()
    }
}

/// Performance metrics for a single agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Number of terminal outcomes (completed or failed) observed.
    pub tasks_completed: u64,

    /// Running average of outcomes, 1.0 for success and 0.0 for failure.
    pub success_rate: f64,

    /// Running average of task duration in seconds.
    pub average_response_time_secs: f64,
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self {
            tasks_completed: 0,
            success_rate: 1.0,
            average_response_time_secs: 0.0,
        }
    }
}

impl AgentMetrics {
    /// Fold a terminal task outcome into the running averages.
    ///
    /// `success_rate` after `n` outcomes equals exactly
    /// (count of successes) / n, because the update is
    /// `(old * (n-1) + outcome) / n` with outcome in {0.0, 1.0}.
    pub fn record_outcome(&mut self, success: bool, duration_secs: f64) {
        self.tasks_completed += 1;
        let n = self.tasks_completed as f64;
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate = (self.success_rate * (n - 1.0) + outcome) / n;
        self.average_response_time_secs =
            (self.average_response_time_secs * (n - 1.0) + duration_secs) / n;
    }
}
