//! Prometheus metrics collection and formatting.
//!
//! This module provides metrics in Prometheus text exposition format.

use std::fmt::Write;

use taskhive_core::AgentStatus;

use crate::state::Coordinator;

/// Collect all metrics from the coordinator and format as Prometheus text.
pub async fn collect_metrics(coordinator: &Coordinator) -> String {
    let mut output = String::new();

    collect_agent_metrics(coordinator, &mut output).await;
    collect_task_metrics(coordinator, &mut output).await;

    output
}

/// Collect agent metrics by status.
async fn collect_agent_metrics(coordinator: &Coordinator, output: &mut String) {
    let state = coordinator.inner.read().await;

    let mut active = 0u64;
    let mut inactive = 0u64;
    for agent in state.agents.values() {
        match agent.status {
            AgentStatus::Active => active += 1,
            AgentStatus::Inactive => inactive += 1,
        }
    }

    writeln!(
        output,
        "# HELP taskhive_agents Number of registered agents by status"
    )
    .ok();
    writeln!(output, "# TYPE taskhive_agents gauge").ok();
    writeln!(output, "taskhive_agents{{status=\"active\"}} {active}").ok();
    writeln!(output, "taskhive_agents{{status=\"inactive\"}} {inactive}").ok();
}

/// Collect task counts and completion-time figures.
async fn collect_task_metrics(coordinator: &Coordinator, output: &mut String) {
    let state = coordinator.inner.read().await;

    let active = state.active.len();
    let completed = state.metrics.tasks_completed;
    let failed = state.metrics.tasks_failed;
    let avg = state.metrics.average_completion_time_secs;

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP taskhive_tasks_active Number of tasks in the active set"
    )
    .ok();
    writeln!(output, "# TYPE taskhive_tasks_active gauge").ok();
    writeln!(output, "taskhive_tasks_active {active}").ok();

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP taskhive_tasks_total Terminal task outcomes by result"
    )
    .ok();
    writeln!(output, "# TYPE taskhive_tasks_total counter").ok();
    writeln!(
        output,
        "taskhive_tasks_total{{outcome=\"completed\"}} {completed}"
    )
    .ok();
    writeln!(output, "taskhive_tasks_total{{outcome=\"failed\"}} {failed}").ok();

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP taskhive_task_completion_seconds_avg Running average completion time"
    )
    .ok();
    writeln!(output, "# TYPE taskhive_task_completion_seconds_avg gauge").ok();
    writeln!(output, "taskhive_task_completion_seconds_avg {avg}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_metrics_empty_state() {
        let coordinator = Coordinator::new();
        let output = collect_metrics(&coordinator).await;

        assert!(output.contains("taskhive_agents"));
        assert!(output.contains("status=\"active\""));

        assert!(output.contains("taskhive_tasks_active 0"));
        assert!(output.contains("taskhive_tasks_total{outcome=\"completed\"} 0"));
        assert!(output.contains("taskhive_tasks_total{outcome=\"failed\"} 0"));
    }

    #[tokio::test]
    async fn test_collect_metrics_after_registration() {
        use std::collections::HashSet;
        use taskhive_core::AgentId;

        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", HashSet::new(), None)
            .await
            .unwrap();

        let output = collect_metrics(&coordinator).await;
        assert!(output.contains("taskhive_agents{status=\"active\"} 1"));
    }
}
