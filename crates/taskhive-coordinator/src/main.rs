//! TaskHive Coordinator Demo
//!
//! Registers a handful of agents, allocates single and parallel tasks, and
//! drives them to completion through the monitor worker.

use std::collections::HashSet;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use taskhive_core::{AgentId, TaskSpec};
use taskhive_coordinator::{collect_metrics, spawn_monitor, Coordinator, ProgressEvent};

fn caps(tags: &[&str]) -> HashSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let coordinator = Coordinator::new();

    coordinator
        .register_agent(
            AgentId::new("analyst-1"),
            "analyst",
            caps(&["data_analysis", "nlp"]),
            Some("inproc://analyst-1".to_string()),
        )
        .await?;
    coordinator
        .register_agent(
            AgentId::new("analyst-2"),
            "analyst",
            caps(&["data_analysis"]),
            None,
        )
        .await?;
    coordinator
        .register_agent(
            AgentId::new("executor-1"),
            "executor",
            caps(&["process_execution", "quality_assurance"]),
            None,
        )
        .await?;

    let (reporter, monitor) = spawn_monitor(coordinator.clone());

    // Single allocation: only executor-1 qualifies.
    let execution = TaskSpec::new("execution")
        .with_capability("process_execution")
        .with_priority(8);
    let execution_id = execution.id.clone();
    coordinator.allocate_task(execution).await?;

    // Parallel allocation across both analysts.
    let analysis = TaskSpec::new("analysis")
        .with_capability("data_analysis")
        .with_priority(7)
        .with_parallelism(2);
    let analysis_id = analysis.id.clone();
    coordinator.allocate_task(analysis).await?;

    // Simulated executor reports flowing through the monitor.
    reporter
        .report(ProgressEvent::in_progress(execution_id.clone(), 50.0))
        .await?;
    reporter
        .report(ProgressEvent::completed(
            execution_id.clone(),
            Some(serde_json::json!({"outcome": "success"})),
        ))
        .await?;
    reporter
        .report(ProgressEvent::in_progress(analysis_id.clone(), 30.0))
        .await?;
    reporter
        .report(ProgressEvent::completed(analysis_id.clone(), None))
        .await?;

    drop(reporter);
    monitor.await?;

    for task_id in [&execution_id, &analysis_id] {
        if let Some(snapshot) = coordinator.task_status(task_id).await {
            info!(
                task_id = %task_id,
                status = ?snapshot.status,
                duration_secs = ?snapshot.duration_secs,
                "Final task state"
            );
        }
    }

    let status = coordinator.system_status().await;
    info!(
        agents = status.agents.total,
        completed = status.tasks.completed,
        failed = status.tasks.failed,
        success_rate = status.tasks.success_rate,
        "System status"
    );

    println!("{}", collect_metrics(&coordinator).await);

    Ok(())
}
