//! Status enums for Agents and Tasks.

use serde::{Deserialize, Serialize};

/// Status of a registered Agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    /// Agent is available for task allocation.
    #[default]
    Active,
    /// Agent is registered but not accepting new tasks.
    Inactive,
}

impl AgentStatus {
    /// Returns true if the agent can receive new allocations.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Status of a Task in the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task has been assigned to one or more agents but not started.
    #[default]
    Allocated,
    /// Task is actively executing.
    InProgress,
    /// Task completed successfully.
    Completed,
    /// Task failed (or was cancelled).
    Failed,
}

impl TaskStatus {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the task is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// `InProgress -> InProgress` is allowed so that progress updates can
    /// flow through the same path as status changes. Terminal states permit
    /// no further transitions.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            Self::Allocated => matches!(
                next,
                Self::InProgress | Self::Completed | Self::Failed
            ),
            Self::InProgress => matches!(
                next,
                Self::InProgress | Self::Completed | Self::Failed
            ),
            Self::Completed | Self::Failed => false,
        }
    }
}
