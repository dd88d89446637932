//! Observability sink consumed by the coordinator.
//!
//! The coordinator records agent registrations, allocations, and status
//! changes into an external entity/relation/observation store when one is
//! configured. Every call is best-effort: failures are logged and never
//! propagated to the caller of a coordinator operation.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use taskhive_core::{AgentId, TaskId, TaskStatus};

use crate::state::Coordinator;

/// Error returned by a sink implementation.
#[derive(Debug, Error)]
#[error("Sink error: {0}")]
pub struct SinkError(pub String);

/// External entity/relation/observation store.
///
/// Implementations are expected to be backed by something like a knowledge
/// graph or an audit log; the coordinator only ever holds opaque entity IDs.
#[async_trait]
pub trait ObservabilitySink: Send + Sync {
    /// Create an entity and return its opaque ID.
    async fn create_entity(
        &self,
        name: &str,
        entity_type: &str,
        observations: &[String],
    ) -> Result<String, SinkError>;

    /// Create a typed relation between two entities.
    async fn create_relation(
        &self,
        from_entity_id: &str,
        relation_type: &str,
        to_entity_id: &str,
    ) -> Result<(), SinkError>;

    /// Append an observation to an existing entity.
    async fn add_observation(&self, entity_id: &str, observation: &str) -> Result<(), SinkError>;
}

/// Sink that accepts and discards everything.
pub struct NoopSink;

#[async_trait]
impl ObservabilitySink for NoopSink {
    async fn create_entity(
        &self,
        name: &str,
        _entity_type: &str,
        _observations: &[String],
    ) -> Result<String, SinkError> {
        Ok(name.to_string())
    }

    async fn create_relation(
        &self,
        _from_entity_id: &str,
        _relation_type: &str,
        _to_entity_id: &str,
    ) -> Result<(), SinkError> {
        Ok(())
    }

    async fn add_observation(&self, _entity_id: &str, _observation: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Log-and-swallow helper for best-effort sink calls.
pub(crate) fn log_sink_failure(operation: &str, err: &SinkError) {
    warn!(operation, error = %err, "Observability sink call failed");
}

impl Coordinator {
    /// Look up or lazily create the coordinator's own sink entity.
    async fn sink_root_entity(&self, sink: &dyn ObservabilitySink) -> Option<String> {
        if let Some(id) = self.entity_ids.lock().await.get("coordinator") {
            return Some(id.clone());
        }
        match sink
            .create_entity(
                "TaskHive Coordinator",
                "Coordinator",
                &["Agent registry and task allocation".to_string()],
            )
            .await
        {
            Ok(id) => {
                self.entity_ids
                    .lock()
                    .await
                    .insert("coordinator".to_string(), id.clone());
                Some(id)
            }
            Err(e) => {
                log_sink_failure("create_entity", &e);
                None
            }
        }
    }

    /// Record a newly registered agent and its COORDINATES relation.
    pub(crate) async fn sink_agent_registered(
        &self,
        agent_id: &AgentId,
        agent_type: &str,
        capabilities: &HashSet<String>,
    ) {
        let Some(sink) = self.sink.as_deref() else {
            return;
        };

        let observations: Vec<String> = capabilities.iter().cloned().collect();
        let entity_id = match sink
            .create_entity(&format!("{agent_type} ({agent_id})"), "Agent", &observations)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                log_sink_failure("create_entity", &e);
                return;
            }
        };

        self.entity_ids
            .lock()
            .await
            .insert(format!("agent:{agent_id}"), entity_id.clone());

        if let Some(root) = self.sink_root_entity(sink).await {
            if let Err(e) = sink.create_relation(&root, "COORDINATES", &entity_id).await {
                log_sink_failure("create_relation", &e);
            }
        }
    }

    /// Record a task allocation and its ASSIGNED_TO relations.
    pub(crate) async fn sink_task_allocated(
        &self,
        task_id: &TaskId,
        task_type: &str,
        agents: &[AgentId],
    ) {
        let Some(sink) = self.sink.as_deref() else {
            return;
        };

        let entity_id = match sink
            .create_entity(
                &format!("Task {task_id}"),
                "Task",
                &[format!("Task {task_id} of type {task_type}")],
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                log_sink_failure("create_entity", &e);
                return;
            }
        };

        let mut ids = self.entity_ids.lock().await;
        ids.insert(format!("task:{task_id}"), entity_id.clone());
        let agent_entities: Vec<String> = agents
            .iter()
            .filter_map(|a| ids.get(&format!("agent:{a}")).cloned())
            .collect();
        drop(ids);

        for agent_entity in agent_entities {
            if let Err(e) = sink
                .create_relation(&agent_entity, "ASSIGNED_TO", &entity_id)
                .await
            {
                log_sink_failure("create_relation", &e);
            }
        }
    }

    /// Record a task status change as an observation.
    pub(crate) async fn sink_status_changed(
        &self,
        task_id: &TaskId,
        from: TaskStatus,
        to: TaskStatus,
    ) {
        let Some(sink) = self.sink.as_deref() else {
            return;
        };

        let entity_id = {
            let ids = self.entity_ids.lock().await;
            ids.get(&format!("task:{task_id}")).cloned()
        };

        if let Some(entity_id) = entity_id {
            let observation = format!("Status changed from {from:?} to {to:?}");
            if let Err(e) = sink.add_observation(&entity_id, &observation).await {
                log_sink_failure("add_observation", &e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use taskhive_core::{TaskSpec, TaskStatus};

    /// Sink that rejects every call.
    struct FailingSink;

    #[async_trait]
    impl ObservabilitySink for FailingSink {
        async fn create_entity(
            &self,
            _name: &str,
            _entity_type: &str,
            _observations: &[String],
        ) -> Result<String, SinkError> {
            Err(SinkError("store unavailable".to_string()))
        }

        async fn create_relation(
            &self,
            _from: &str,
            _relation_type: &str,
            _to: &str,
        ) -> Result<(), SinkError> {
            Err(SinkError("store unavailable".to_string()))
        }

        async fn add_observation(&self, _entity_id: &str, _obs: &str) -> Result<(), SinkError> {
            Err(SinkError("store unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_sink_failures_never_propagate() {
        let coordinator = Coordinator::with_sink(
            crate::CoordinatorConfig::default(),
            Arc::new(FailingSink),
        );

        let mut caps = HashSet::new();
        caps.insert("nlp".to_string());
        coordinator
            .register_agent(AgentId::new("a1"), "worker", caps, None)
            .await
            .expect("registration must not depend on the sink");

        let spec = TaskSpec::new("analysis").with_capability("nlp");
        let task_id = spec.id.clone();
        coordinator
            .allocate_task(spec)
            .await
            .expect("allocation must not depend on the sink");

        coordinator
            .update_task_status(&task_id, TaskStatus::Completed, Some(100.0), None)
            .await
            .expect("lifecycle must not depend on the sink");

        let status = coordinator.system_status().await;
        assert_eq!(status.tasks.completed, 1);
    }

    #[tokio::test]
    async fn test_noop_sink_echoes_entity_name() {
        let sink = NoopSink;
        let id = sink
            .create_entity("Task t1", "Task", &[])
            .await
            .expect("noop sink never fails");
        assert_eq!(id, "Task t1");
        sink.create_relation(&id, "ASSIGNED_TO", "other")
            .await
            .expect("noop sink never fails");
    }
}
