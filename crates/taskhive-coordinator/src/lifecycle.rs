//! Task lifecycle state machine and archival.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use taskhive_core::{Allocation, CoreError, TaskId, TaskStatus};

use crate::state::Coordinator;

/// Read-only view of a task, whether active or archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress: f64,
    pub allocation: Allocation,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<f64>,
    pub result: Option<serde_json::Value>,
}

impl Coordinator {
    /// Update the status of an active task.
    ///
    /// Rejects unknown tasks, progress outside [0, 100], and transitions the
    /// four-state machine does not permit; nothing is mutated on rejection.
    ///
    /// A transition into Completed or Failed runs the whole terminal
    /// sequence under one lock hold: the task ID is removed from every
    /// allocated agent's assignment list, each agent's metrics fold in the
    /// outcome, system metrics update, and the record moves from the active
    /// set into history. A task is never visible in both stores.
    pub async fn update_task_status(
        &self,
        task_id: &TaskId,
        status: TaskStatus,
        progress: Option<f64>,
        result: Option<serde_json::Value>,
    ) -> Result<(), CoreError> {
        self.apply_transition(task_id, status, progress, result, false)
            .await
    }

    /// Cancel an active task.
    ///
    /// Reuses the terminal-transition path with status Failed; the archived
    /// record is tagged as cancelled and every allocated agent records a
    /// failure outcome.
    pub async fn cancel_task(&self, task_id: &TaskId) -> Result<(), CoreError> {
        self.apply_transition(task_id, TaskStatus::Failed, None, None, true)
            .await
    }

    async fn apply_transition(
        &self,
        task_id: &TaskId,
        status: TaskStatus,
        progress: Option<f64>,
        result: Option<serde_json::Value>,
        cancelled: bool,
    ) -> Result<(), CoreError> {
        if let Some(p) = progress {
            if !(0.0..=100.0).contains(&p) {
                return Err(CoreError::InvalidProgress(p));
            }
        }

        let old_status = {
            let mut state = self.inner.write().await;

            // Take ownership of the record; it goes back into the active set
            // unless this transition is terminal (or rejected).
            let mut task = state.active.remove(task_id).ok_or_else(|| {
                warn!(task_id = %task_id, "Cannot update unknown task");
                CoreError::TaskNotFound(task_id.as_str().to_string())
            })?;

            let old_status = task.status;
            if !old_status.can_transition_to(status) {
                state.active.insert(task_id.clone(), task);
                return Err(CoreError::InvalidStateTransition {
                    from: format!("{old_status:?}"),
                    to: format!("{status:?}"),
                });
            }

            let now = Utc::now();
            task.status = status;
            task.last_updated = now;
            if let Some(p) = progress {
                task.progress = p;
            }
            if let Some(r) = result {
                task.result = Some(r);
            }

            if status.is_terminal() {
                let success = status == TaskStatus::Completed;
                let duration_secs =
                    (now - task.started_at).num_milliseconds().max(0) as f64 / 1000.0;

                for agent_id in &task.allocation.agents {
                    if let Some(agent) = state.agents.get_mut(agent_id) {
                        agent.assigned_tasks.retain(|id| id != task_id);
                        agent.metrics.record_outcome(success, duration_secs);
                        agent.last_activity = now;
                    }
                }

                if success {
                    state.metrics.record_completion(duration_secs);
                } else {
                    state.metrics.record_failure();
                }

                state
                    .history
                    .push_back(task.into_archived(status, now, cancelled));
                while state.history.len() > self.config.history_limit {
                    state.history.pop_front();
                }
            } else {
                state.active.insert(task_id.clone(), task);
            }

            old_status
        };

        info!(
            task_id = %task_id,
            from = ?old_status,
            to = ?status,
            cancelled,
            "Task status updated"
        );

        self.sink_status_changed(task_id, old_status, status).await;

        Ok(())
    }

    /// Current status of a task, checking the active set then history.
    ///
    /// Returns `None` for task IDs the coordinator has never seen (or whose
    /// archived record was evicted from the capped history).
    pub async fn task_status(&self, task_id: &TaskId) -> Option<TaskSnapshot> {
        let state = self.inner.read().await;

        if let Some(task) = state.active.get(task_id) {
            return Some(TaskSnapshot {
                task_id: task_id.clone(),
                status: task.status,
                progress: task.progress,
                allocation: task.allocation.clone(),
                started_at: task.started_at,
                finished_at: None,
                duration_secs: None,
                result: task.result.clone(),
            });
        }

        // History is small and capped; a linear scan from the newest end is
        // acceptable here.
        state
            .history
            .iter()
            .rev()
            .find(|t| &t.spec.id == task_id)
            .map(|task| TaskSnapshot {
                task_id: task_id.clone(),
                status: task.status,
                progress: task.progress,
                allocation: task.allocation.clone(),
                started_at: task.started_at,
                finished_at: Some(task.finished_at),
                duration_secs: Some(task.duration_secs),
                result: task.result.clone(),
            })
    }
}
