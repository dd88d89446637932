//! Background monitor worker.
//!
//! Executing agents report progress through a channel; the monitor drains
//! it and advances task state without ever blocking the caller of
//! `allocate_task`. A report for a task that already left the active set is
//! a logged no-op, not an error: the executor may race the archival.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use taskhive_core::{CoreError, TaskId, TaskStatus};

use crate::state::Coordinator;

/// A progress report from an executing agent.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Task being reported on.
    pub task_id: TaskId,

    /// New status for the task.
    pub status: TaskStatus,

    /// Optional progress percentage (0-100).
    pub progress: Option<f64>,

    /// Optional result payload (usually on a terminal report).
    pub result: Option<serde_json::Value>,
}

impl ProgressEvent {
    /// An in-progress report at the given percentage.
    pub fn in_progress(task_id: TaskId, progress: f64) -> Self {
        Self {
            task_id,
            status: TaskStatus::InProgress,
            progress: Some(progress),
            result: None,
        }
    }

    /// A completion report with an optional result payload.
    pub fn completed(task_id: TaskId, result: Option<serde_json::Value>) -> Self {
        Self {
            task_id,
            status: TaskStatus::Completed,
            progress: Some(100.0),
            result,
        }
    }

    /// A failure report with an optional error payload.
    pub fn failed(task_id: TaskId, result: Option<serde_json::Value>) -> Self {
        Self {
            task_id,
            status: TaskStatus::Failed,
            progress: None,
            result,
        }
    }
}

/// Handle used by executing agents to report progress to the monitor.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressReporter {
    /// Send a progress event. Fails only when the monitor has shut down.
    pub async fn report(
        &self,
        event: ProgressEvent,
    ) -> Result<(), mpsc::error::SendError<ProgressEvent>> {
        self.tx.send(event).await
    }
}

/// Spawn the monitor worker for a coordinator.
///
/// Returns the reporter half and the worker's join handle. The worker exits
/// once every reporter clone has been dropped and the channel drains.
pub fn spawn_monitor(coordinator: Arc<Coordinator>) -> (ProgressReporter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(coordinator.config.progress_channel_capacity);

    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            apply_event(&coordinator, event).await;
        }
        info!("Monitor worker shutting down");
    });

    (ProgressReporter { tx }, handle)
}

async fn apply_event(coordinator: &Coordinator, event: ProgressEvent) {
    let ProgressEvent {
        task_id,
        status,
        progress,
        result,
    } = event;

    match coordinator
        .update_task_status(&task_id, status, progress, result)
        .await
    {
        Ok(()) => {}
        // Task already archived by the time the report arrived.
        Err(CoreError::TaskNotFound(_)) => {
            debug!(task_id = %task_id, "Progress report for inactive task ignored");
        }
        Err(e) => {
            warn!(task_id = %task_id, error = %e, "Progress report rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use taskhive_core::{AgentId, TaskSpec};

    fn caps(tags: &[&str]) -> HashSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_monitor_drives_task_to_completion() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();

        let spec = TaskSpec::new("analysis").with_capability("nlp");
        let task_id = spec.id.clone();
        coordinator.allocate_task(spec).await.unwrap();

        let (reporter, handle) = spawn_monitor(coordinator.clone());
        reporter
            .report(ProgressEvent::in_progress(task_id.clone(), 50.0))
            .await
            .unwrap();
        reporter
            .report(ProgressEvent::completed(
                task_id.clone(),
                Some(serde_json::json!({"outcome": "success"})),
            ))
            .await
            .unwrap();
        drop(reporter);
        handle.await.unwrap();

        let snapshot = coordinator.task_status(&task_id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);
        assert_eq!(coordinator.active_task_count().await, 0);
    }

    #[tokio::test]
    async fn test_report_for_archived_task_is_noop() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();

        let spec = TaskSpec::new("analysis").with_capability("nlp");
        let task_id = spec.id.clone();
        coordinator.allocate_task(spec).await.unwrap();
        coordinator
            .update_task_status(&task_id, TaskStatus::Completed, None, None)
            .await
            .unwrap();

        let (reporter, handle) = spawn_monitor(coordinator.clone());
        // Late report after archival: swallowed, not an error.
        reporter
            .report(ProgressEvent::in_progress(task_id.clone(), 75.0))
            .await
            .unwrap();
        drop(reporter);
        handle.await.unwrap();

        let snapshot = coordinator.task_status(&task_id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);

        let status = coordinator.system_status().await;
        assert_eq!(status.tasks.completed, 1);
    }

    #[tokio::test]
    async fn test_concurrent_reports_for_independent_tasks() {
        let coordinator = Coordinator::new();
        for id in ["a1", "a2"] {
            coordinator
                .register_agent(AgentId::new(id), "worker", caps(&["nlp"]), None)
                .await
                .unwrap();
        }

        let mut ids = Vec::new();
        for _ in 0..4 {
            let spec = TaskSpec::new("t").with_capability("nlp");
            ids.push(spec.id.clone());
            coordinator.allocate_task(spec).await.unwrap();
        }

        let (reporter, handle) = spawn_monitor(coordinator.clone());
        let mut senders = Vec::new();
        for task_id in ids.clone() {
            let reporter = reporter.clone();
            senders.push(tokio::spawn(async move {
                reporter
                    .report(ProgressEvent::completed(task_id, None))
                    .await
                    .unwrap();
            }));
        }
        for sender in senders {
            sender.await.unwrap();
        }
        drop(reporter);
        handle.await.unwrap();

        assert_eq!(coordinator.active_task_count().await, 0);
        let status = coordinator.system_status().await;
        assert_eq!(status.tasks.completed, 4);
    }
}
