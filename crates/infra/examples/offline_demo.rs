//! Wires the full offline stack together and records a session while the
//! remote store is unreachable.
//!
//! Run with `cargo run -p flexlog-infra --example offline_demo`.

use std::sync::Arc;

use chrono::Utc;
use flexlog_core::{ActionLog, SyncOrchestrator, WorkoutService};
use flexlog_domain::{
    Exercise, QueueConfig, SetEntry, SyncAttempt, WorkoutDraft, WorkoutPatch, WorkoutStatus,
};
use flexlog_infra::{
    DbManager, HttpRemoteStore, ReachabilityMonitor, SqliteActionLogRepository,
    SqliteIdMappingRepository, SqliteOfflineWorkoutRepository,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = flexlog_infra::config::load().unwrap_or_default();
    let queue_limits: QueueConfig = config.queue.clone();

    let manager = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
    manager.run_migrations()?;

    let actions = Arc::new(SqliteActionLogRepository::new(Arc::clone(&manager)));
    let cache = Arc::new(SqliteOfflineWorkoutRepository::new(Arc::clone(&manager)));
    let mappings = Arc::new(SqliteIdMappingRepository::new(Arc::clone(&manager)));
    let monitor = Arc::new(ReachabilityMonitor::new(false));
    let remote = Arc::new(HttpRemoteStore::new(&config.remote)?);

    let service = WorkoutService::new(
        remote.clone(),
        actions.clone(),
        cache.clone(),
        monitor.clone(),
        queue_limits,
    );
    let orchestrator =
        SyncOrchestrator::new(actions.clone(), cache, mappings, remote, monitor);

    // Record a session while unreachable: everything lands in the local
    // durable store and the caller never sees an error.
    let draft = WorkoutDraft {
        workout_date: Utc::now().date_naive(),
        exercises: vec![Exercise {
            name: "Deadlift".to_string(),
            sets: vec![SetEntry { reps: 5, weight_kg: Some(140.0) }],
        }],
        notes: Some("recorded offline".to_string()),
        status: WorkoutStatus::InProgress,
    };

    let record = service.create(draft).await?;
    let local_id = record.workout().id.clone();
    info!(id = %local_id, offline = record.is_offline(), "workout recorded");

    let patch = WorkoutPatch { status: Some(WorkoutStatus::Completed), ..WorkoutPatch::default() };
    service.update(&local_id, patch).await?;
    info!(queued = actions.depth().await?, "session finalized locally");

    // A drain attempt while unreachable is refused, not an error.
    match orchestrator.sync_now().await? {
        SyncAttempt::Completed(report) => info!(summary = %report.summary(), "drain completed"),
        SyncAttempt::Skipped(reason) => info!(%reason, "drain skipped"),
    }

    Ok(())
}
