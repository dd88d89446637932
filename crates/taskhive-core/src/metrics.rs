//! System-wide aggregate metrics and the status summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-wide aggregate metrics, recomputed incrementally on each
/// terminal transition. Never reset except at process start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Tasks that reached Completed.
    pub tasks_completed: u64,

    /// Tasks that reached Failed.
    pub tasks_failed: u64,

    /// Running average completion time over completed tasks, in seconds.
    pub average_completion_time_secs: f64,
}

impl SystemMetrics {
    /// Record a successful completion with its duration.
    pub fn record_completion(&mut self, duration_secs: f64) {
        self.tasks_completed += 1;
        let n = self.tasks_completed as f64;
        self.average_completion_time_secs =
            (self.average_completion_time_secs * (n - 1.0) + duration_secs) / n;
    }

    /// Record a failed task.
    pub fn record_failure(&mut self) {
        self.tasks_failed += 1;
    }

    /// Fraction of terminal outcomes that completed; 1.0 before any outcome.
    pub fn success_rate(&self) -> f64 {
        let total = self.tasks_completed + self.tasks_failed;
        if total == 0 {
            1.0
        } else {
            self.tasks_completed as f64 / total as f64
        }
    }
}

/// Counts of registered agents by status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCounts {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

/// Counts of tasks across the active set and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub active: usize,
    pub completed: u64,
    pub failed: u64,
    pub success_rate: f64,
}

/// Aggregate performance figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub average_completion_time_secs: f64,
}

/// Point-in-time summary of the whole coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub timestamp: DateTime<Utc>,
    pub agents: AgentCounts,
    pub tasks: TaskCounts,
    pub performance: PerformanceSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_completion_time() {
        let mut metrics = SystemMetrics::default();
        metrics.record_completion(2.0);
        metrics.record_completion(4.0);
        assert_eq!(metrics.tasks_completed, 2);
        assert!((metrics.average_completion_time_secs - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_failure_does_not_touch_average() {
        let mut metrics = SystemMetrics::default();
        metrics.record_completion(10.0);
        metrics.record_failure();
        assert!((metrics.average_completion_time_secs - 10.0).abs() < 1e-9);
        assert!((metrics.success_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_success_rate_without_outcomes() {
        assert_eq!(SystemMetrics::default().success_rate(), 1.0);
    }
}
