//! TaskHive Coordinator Library
//!
//! This crate provides the coordinator functionality for TaskHive:
//! agent registry maintenance, suitability scoring and allocation,
//! the task lifecycle state machine, and the background monitor worker.

pub mod allocator;
pub mod config;
pub mod lifecycle;
pub mod metrics;
pub mod monitor;
pub mod registry;
pub mod sink;
pub mod state;

pub use allocator::{AllocationOutcome, UnallocatedReason};
pub use config::CoordinatorConfig;
pub use lifecycle::TaskSnapshot;
pub use metrics::collect_metrics;
pub use monitor::{spawn_monitor, ProgressEvent, ProgressReporter};
pub use sink::{NoopSink, ObservabilitySink, SinkError};
pub use state::Coordinator;
