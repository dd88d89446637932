//! Suitability scoring and task allocation.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use taskhive_core::{
    ActiveTask, AgentId, AgentRecord, Allocation, AllocationType, CoreError, TaskId, TaskSpec,
};

use crate::registry::eligible_agents;
use crate::state::Coordinator;

/// Weight of the capability-match component.
const CAPABILITY_WEIGHT: f64 = 0.5;

/// Weight of the historical success-rate component.
const SUCCESS_RATE_WEIGHT: f64 = 0.3;

/// How strongly current load discounts the combined score. At full load the
/// score retains 20% of its capability/reliability value, so a saturated but
/// well-matched agent can still win when no alternative exists.
const LOAD_PENALTY: f64 = 0.8;

/// Compute the suitability score for an (agent, requirement) pair.
///
/// `capability_score` is the fraction of required capabilities the agent
/// covers (1.0 for an empty requirement). Agents reaching the scorer have
/// already passed the superset filter, so it is always 1.0 today; it is
/// computed anyway so the filter can be relaxed without touching the formula.
pub fn suitability_score(
    agent: &AgentRecord,
    required: &HashSet<String>,
    max_tasks_per_agent: usize,
) -> f64 {
    let load_factor = (agent.load() as f64 / max_tasks_per_agent as f64).min(1.0);

    let capability_score = if required.is_empty() {
        1.0
    } else {
        let matched = required.intersection(&agent.capabilities).count();
        matched as f64 / required.len() as f64
    };

    (capability_score * CAPABILITY_WEIGHT + agent.metrics.success_rate * SUCCESS_RATE_WEIGHT)
        * (1.0 - load_factor * LOAD_PENALTY)
}

/// Why an allocation attempt produced no assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnallocatedReason {
    /// No active agent covers the required capability set.
    NoSuitableAgents,
}

/// Result of an allocation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AllocationOutcome {
    /// The task was bound to one or more agents.
    Allocated(Allocation),
    /// No agent qualified; nothing was mutated.
    Unallocated {
        task_id: TaskId,
        reason: UnallocatedReason,
    },
}

impl AllocationOutcome {
    /// The allocation record, if the task was allocated.
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            Self::Allocated(allocation) => Some(allocation),
            Self::Unallocated { .. } => None,
        }
    }
}

impl Coordinator {
    /// Allocate a task to the most suitable agent(s).
    ///
    /// Eligible agents are scored and sorted by descending score, ties
    /// broken by agent ID ascending so the outcome is deterministic. With
    /// `parallel_execution` set and more than one eligible agent, the top
    /// `min(parallelism, eligible)` agents are selected; otherwise the
    /// single top scorer.
    ///
    /// The whole read-score-select-assign sequence runs under one write
    /// lock, so concurrent allocations observe each other's load increments
    /// and either all selected agents record the assignment or none do.
    pub async fn allocate_task(&self, spec: TaskSpec) -> Result<AllocationOutcome, CoreError> {
        if !(1..=10).contains(&spec.priority) {
            return Err(CoreError::InvalidPriority(spec.priority));
        }

        let task_id = spec.id.clone();
        let task_type = spec.task_type.clone();
        let allocation = {
            let mut state = self.inner.write().await;

            if state.active.contains_key(&task_id) {
                return Err(CoreError::DuplicateTask(task_id.into_inner()));
            }

            let mut scored: Vec<(AgentId, f64)> =
                eligible_agents(&state, &spec.required_capabilities)
                    .into_iter()
                    .map(|agent| {
                        let score = suitability_score(
                            agent,
                            &spec.required_capabilities,
                            self.config.max_tasks_per_agent,
                        );
                        (agent.id.clone(), score)
                    })
                    .collect();

            if scored.is_empty() {
                warn!(task_id = %task_id, "No suitable agents for task");
                return Ok(AllocationOutcome::Unallocated {
                    task_id,
                    reason: UnallocatedReason::NoSuitableAgents,
                });
            }

            scored.sort_by(|(a_id, a_score), (b_id, b_score)| {
                b_score
                    .partial_cmp(a_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a_id.cmp(b_id))
            });

            let allocation_type = if spec.parallel_execution && scored.len() > 1 {
                AllocationType::Parallel
            } else {
                AllocationType::Single
            };

            let selected = match allocation_type {
                AllocationType::Parallel => spec.parallelism.max(1).min(scored.len()),
                AllocationType::Single => 1,
            };

            let agents: Vec<AgentId> = scored
                .into_iter()
                .take(selected)
                .map(|(id, _)| id)
                .collect();

            let now = Utc::now();
            for agent_id in &agents {
                // Selected from this same locked state, so the entry exists.
                if let Some(agent) = state.agents.get_mut(agent_id) {
                    agent.assigned_tasks.push(task_id.clone());
                    agent.last_activity = now;
                }
            }

            let allocation = Allocation {
                task_id: task_id.clone(),
                allocation_type,
                agents,
                allocated_at: now,
                priority: spec.priority,
            };

            state
                .active
                .insert(task_id.clone(), ActiveTask::new(spec, allocation.clone()));

            allocation
        };

        info!(
            task_id = %task_id,
            allocation_type = ?allocation.allocation_type,
            agents = ?allocation.agents,
            "Task allocated"
        );

        self.sink_task_allocated(&task_id, &task_type, &allocation.agents)
            .await;

        Ok(AllocationOutcome::Allocated(allocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(tags: &[&str]) -> HashSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn agent_with_load(id: &str, load: usize) -> AgentRecord {
        let mut record = AgentRecord::new(AgentId::new(id), "worker").with_capability("nlp");
        for _ in 0..load {
            record.assigned_tasks.push(TaskId::generate());
        }
        record
    }

    #[test]
    fn test_score_idle_perfect_agent() {
        let agent = agent_with_load("a1", 0);
        let score = suitability_score(&agent, &caps(&["nlp"]), 10);
        // (1.0 * 0.5 + 1.0 * 0.3) * 1.0
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_discounted_by_load() {
        let idle = agent_with_load("a1", 0);
        let busy = agent_with_load("a2", 5);
        let required = caps(&["nlp"]);
        assert!(suitability_score(&idle, &required, 10) > suitability_score(&busy, &required, 10));

        // At half load the discount is 1 - 0.5 * 0.8 = 0.6.
        let score = suitability_score(&busy, &required, 10);
        assert!((score - 0.8 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_saturated_agent_keeps_twenty_percent() {
        let saturated = agent_with_load("a1", 15);
        let score = suitability_score(&saturated, &caps(&["nlp"]), 10);
        assert!((score - 0.8 * 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_empty_requirement_capability_score() {
        let agent = agent_with_load("a1", 0);
        let score = suitability_score(&agent, &HashSet::new(), 10);
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_single_allocation_picks_only_eligible() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();
        coordinator
            .register_agent(AgentId::new("a2"), "worker", caps(&["nlp", "vision"]), None)
            .await
            .unwrap();

        let spec = TaskSpec::new("analysis")
            .with_capability("nlp")
            .with_capability("vision");
        let task_id = spec.id.clone();

        let outcome = coordinator.allocate_task(spec).await.unwrap();
        let allocation = outcome.allocation().expect("task should be allocated");
        assert_eq!(allocation.allocation_type, AllocationType::Single);
        assert_eq!(allocation.agents, vec![AgentId::new("a2")]);

        let a2 = coordinator.agent(&AgentId::new("a2")).await.unwrap();
        assert_eq!(a2.assigned_tasks, vec![task_id]);
        let a1 = coordinator.agent(&AgentId::new("a1")).await.unwrap();
        assert!(a1.assigned_tasks.is_empty());
    }

    #[tokio::test]
    async fn test_parallel_allocation_loads_both_agents() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();
        coordinator
            .register_agent(AgentId::new("a2"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();

        let spec = TaskSpec::new("analysis")
            .with_capability("nlp")
            .with_parallelism(2);

        let outcome = coordinator.allocate_task(spec).await.unwrap();
        let allocation = outcome.allocation().unwrap();
        assert_eq!(allocation.allocation_type, AllocationType::Parallel);
        assert_eq!(allocation.agents.len(), 2);

        for id in ["a1", "a2"] {
            let agent = coordinator.agent(&AgentId::new(id)).await.unwrap();
            assert_eq!(agent.load(), 1);
        }
    }

    #[tokio::test]
    async fn test_parallelism_capped_by_eligible_count() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();
        coordinator
            .register_agent(AgentId::new("a2"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();

        let spec = TaskSpec::new("analysis")
            .with_capability("nlp")
            .with_parallelism(5);
        let outcome = coordinator.allocate_task(spec).await.unwrap();
        assert_eq!(outcome.allocation().unwrap().agents.len(), 2);
    }

    #[tokio::test]
    async fn test_parallel_request_with_one_agent_falls_back_to_single() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();

        let spec = TaskSpec::new("analysis")
            .with_capability("nlp")
            .with_parallelism(2);
        let outcome = coordinator.allocate_task(spec).await.unwrap();
        let allocation = outcome.allocation().unwrap();
        assert_eq!(allocation.allocation_type, AllocationType::Single);
        assert_eq!(allocation.agents.len(), 1);
    }

    #[tokio::test]
    async fn test_no_suitable_agents_mutates_nothing() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&["nlp"]), None)
            .await
            .unwrap();

        let spec = TaskSpec::new("render").with_capability("graphics");
        let task_id = spec.id.clone();
        let outcome = coordinator.allocate_task(spec).await.unwrap();

        assert_eq!(
            outcome,
            AllocationOutcome::Unallocated {
                task_id,
                reason: UnallocatedReason::NoSuitableAgents,
            }
        );
        assert_eq!(coordinator.active_task_count().await, 0);
        let a1 = coordinator.agent(&AgentId::new("a1")).await.unwrap();
        assert!(a1.assigned_tasks.is_empty());
    }

    #[tokio::test]
    async fn test_ties_break_by_agent_id() {
        let coordinator = Coordinator::new();
        // Identical records: identical scores.
        for id in ["b2", "b1", "b3"] {
            coordinator
                .register_agent(AgentId::new(id), "worker", caps(&["nlp"]), None)
                .await
                .unwrap();
        }

        let spec = TaskSpec::new("analysis")
            .with_capability("nlp")
            .with_parallelism(2);
        let outcome = coordinator.allocate_task(spec).await.unwrap();
        assert_eq!(
            outcome.allocation().unwrap().agents,
            vec![AgentId::new("b1"), AgentId::new("b2")]
        );
    }

    #[tokio::test]
    async fn test_invalid_priority_rejected_before_mutation() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&[]), None)
            .await
            .unwrap();

        let spec = TaskSpec::new("t").with_priority(11);
        let err = coordinator.allocate_task(spec).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidPriority(11)));
        assert_eq!(coordinator.active_task_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_active_task_id_rejected() {
        let coordinator = Coordinator::new();
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps(&[]), None)
            .await
            .unwrap();

        let id = TaskId::new("t-1");
        coordinator
            .allocate_task(TaskSpec::new("t").with_id(id.clone()))
            .await
            .unwrap();
        let err = coordinator
            .allocate_task(TaskSpec::new("t").with_id(id))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTask(_)));
    }
}
