//! Coordinator configuration.

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Load-factor saturation point: an agent at this many assigned tasks
    /// has load_factor 1.0.
    pub max_tasks_per_agent: usize,

    /// Maximum archived tasks kept in the history ring; the oldest record
    /// is evicted when the cap is exceeded.
    pub history_limit: usize,

    /// Capacity of the monitor's progress-event channel.
    pub progress_channel_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_agent: 10,
            history_limit: 1024,
            progress_channel_capacity: 64,
        }
    }
}
