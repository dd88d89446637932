//! Core domain errors.

use thiserror::Error;

/// Core domain errors for TaskHive.
///
/// Every variant is recoverable: the coordinator returns these to the
/// caller and never terminates the process on them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Agent ID is already registered.
    #[error("Agent already registered: {0}")]
    DuplicateAgent(String),

    /// Agent not found.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Task ID is already active.
    #[error("Task already active: {0}")]
    DuplicateTask(String),

    /// Task not found in the active set.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Priority outside the accepted 1-10 range.
    #[error("Invalid priority {0}: must be between 1 and 10")]
    InvalidPriority(u8),

    /// Progress outside the accepted 0-100 range.
    #[error("Invalid progress {0}: must be between 0.0 and 100.0")]
    InvalidProgress(f64),
}
