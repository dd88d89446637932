//! Agent registry operations.
//!
//! Load, assignment, and metric mutations live in the allocator and
//! lifecycle modules; this module only covers registration, status
//! changes, and read access.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};

use taskhive_core::{AgentId, AgentRecord, AgentStatus, CoreError};

use crate::state::{Coordinator, CoordinatorState};

impl Coordinator {
    /// Register a new agent.
    ///
    /// Fails with [`CoreError::DuplicateAgent`] when the ID is already
    /// present, leaving the registry untouched. A freshly registered agent
    /// is Active, carries no assignments, and starts with success_rate 1.0.
    pub async fn register_agent(
        &self,
        agent_id: AgentId,
        agent_type: impl Into<String>,
        capabilities: HashSet<String>,
        endpoint: Option<String>,
    ) -> Result<(), CoreError> {
        let agent_type = agent_type.into();

        {
            let mut state = self.inner.write().await;
            if state.agents.contains_key(&agent_id) {
                warn!(agent_id = %agent_id, "Agent already registered");
                return Err(CoreError::DuplicateAgent(agent_id.into_inner()));
            }

            let mut record = AgentRecord::new(agent_id.clone(), agent_type.clone())
                .with_capabilities(capabilities.clone());
            record.endpoint = endpoint;
            state.agents.insert(agent_id.clone(), record);
        }

        info!(
            agent_id = %agent_id,
            agent_type = %agent_type,
            capabilities = ?capabilities,
            "Agent registered"
        );

        self.sink_agent_registered(&agent_id, &agent_type, &capabilities)
            .await;

        Ok(())
    }

    /// Change an agent's availability status.
    ///
    /// Inactive agents keep their record and metrics but are skipped by the
    /// allocator. There is no deregistration.
    pub async fn set_agent_status(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> Result<(), CoreError> {
        let mut state = self.inner.write().await;
        let agent = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| CoreError::AgentNotFound(agent_id.as_str().to_string()))?;

        agent.status = status;
        agent.last_activity = Utc::now();

        info!(agent_id = %agent_id, status = ?status, "Agent status changed");
        Ok(())
    }

    /// Snapshot of a single agent record.
    pub async fn agent(&self, agent_id: &AgentId) -> Option<AgentRecord> {
        self.inner.read().await.agents.get(agent_id).cloned()
    }
}

/// Active agents whose capability set covers every required capability.
///
/// An empty requirement set matches all active agents.
pub(crate) fn eligible_agents<'a>(
    state: &'a CoordinatorState,
    required: &HashSet<String>,
) -> Vec<&'a AgentRecord> {
    state
        .agents
        .values()
        .filter(|agent| agent.status.is_active() && agent.has_capabilities(required))
        .collect()
}
