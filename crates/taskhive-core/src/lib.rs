//! TaskHive Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network transports
//! - Database
//! - Runtime specifics
//!
//! All types here represent the core business domain of TaskHive: agents
//! advertising capabilities, task specifications, allocations binding tasks
//! to agents, and the metrics derived from task outcomes.

pub mod agent;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use agent::{AgentMetrics, AgentRecord};
pub use error::CoreError;
pub use ids::{AgentId, TaskId};
pub use metrics::{AgentCounts, PerformanceSummary, SystemMetrics, SystemStatus, TaskCounts};
pub use status::{AgentStatus, TaskStatus};
pub use task::{ActiveTask, Allocation, AllocationType, ArchivedTask, TaskSpec};
