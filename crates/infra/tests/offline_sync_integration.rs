//! End-to-end reconnection flow over the real adapters: SQLite durable store,
//! HTTP remote store (wiremock), reachability monitor, and sync engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use flexlog_core::{
    ActionLog, IdMappingRepository, OfflineWorkoutCache, SyncOrchestrator, WorkoutService,
};
use flexlog_domain::{
    Exercise, QueueConfig, SetEntry, SyncAttempt, WorkoutDraft, WorkoutPatch, WorkoutStatus,
};
use flexlog_infra::{
    DbManager, HttpClient, HttpRemoteStore, ReachabilityMonitor, SqliteActionLogRepository,
    SqliteIdMappingRepository, SqliteOfflineWorkoutRepository, SyncWorker, SyncWorkerConfig,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    actions: Arc<SqliteActionLogRepository>,
    cache: Arc<SqliteOfflineWorkoutRepository>,
    mappings: Arc<SqliteIdMappingRepository>,
    monitor: Arc<ReachabilityMonitor>,
    service: WorkoutService,
    orchestrator: Arc<SyncOrchestrator>,
    _dir: TempDir,
}

fn build_stack(server: &MockServer, initially_reachable: bool) -> Stack {
    let dir = TempDir::new().expect("temp dir created");
    let manager =
        Arc::new(DbManager::new(dir.path().join("flexlog.db"), 2).expect("manager created"));
    manager.run_migrations().expect("migrations run");

    let actions = Arc::new(SqliteActionLogRepository::new(Arc::clone(&manager)));
    let cache = Arc::new(SqliteOfflineWorkoutRepository::new(Arc::clone(&manager)));
    let mappings = Arc::new(SqliteIdMappingRepository::new(Arc::clone(&manager)));
    let monitor = Arc::new(ReachabilityMonitor::new(initially_reachable));
    let remote = Arc::new(HttpRemoteStore::with_client(
        HttpClient::new().expect("http client"),
        server.uri(),
    ));

    let service = WorkoutService::new(
        remote.clone(),
        actions.clone(),
        cache.clone(),
        monitor.clone(),
        QueueConfig::default(),
    );
    let orchestrator = Arc::new(SyncOrchestrator::new(
        actions.clone(),
        cache.clone(),
        mappings.clone(),
        remote,
        monitor.clone(),
    ));

    Stack { actions, cache, mappings, monitor, service, orchestrator, _dir: dir }
}

fn session_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn session_draft() -> WorkoutDraft {
    WorkoutDraft {
        workout_date: session_date(),
        exercises: vec![Exercise {
            name: "Squat".to_string(),
            sets: vec![SetEntry { reps: 5, weight_kg: Some(100.0) }],
        }],
        notes: Some("morning session".to_string()),
        status: WorkoutStatus::InProgress,
    }
}

fn remote_workout(id: &str, status: WorkoutStatus) -> flexlog_domain::Workout {
    let mut workout = session_draft().materialize(id, 1_741_600_000);
    workout.status = status;
    workout
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_finalized_workout_migrates_on_reconnect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/workouts"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(remote_workout("srv-1", WorkoutStatus::InProgress)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/workouts/srv-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(remote_workout("srv-1", WorkoutStatus::Completed)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stack = build_stack(&server, false);

    // Record and finalize a full session while unreachable.
    let record = stack.service.create(session_draft()).await.expect("offline create");
    assert!(record.is_offline());
    let local_id = record.workout().id.clone();

    let patch =
        WorkoutPatch { status: Some(WorkoutStatus::Completed), ..WorkoutPatch::default() };
    stack.service.update(&local_id, patch).await.expect("offline finalize");

    assert_eq!(stack.actions.depth().await.unwrap(), 1);

    // Reconnect and drain.
    stack.monitor.set_reachable(true);
    let attempt = stack.orchestrator.sync_now().await.expect("drain runs");
    let report = match attempt {
        SyncAttempt::Completed(report) => report,
        SyncAttempt::Skipped(reason) => panic!("drain skipped: {reason}"),
    };

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);

    // Local state converged: nothing queued, nothing cached, id bridged.
    assert_eq!(stack.actions.depth().await.unwrap(), 0);
    assert!(stack.cache.get(&local_id).await.unwrap().is_none());
    let remote_id = stack.mappings.resolve(&local_id).await.unwrap();
    assert_eq!(remote_id.as_deref(), Some("srv-1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_drains_offline_delete_after_transition() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/workouts/w-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let stack = build_stack(&server, false);

    stack.service.delete("w-9").await.expect("offline delete queues");
    assert_eq!(stack.actions.depth().await.unwrap(), 1);

    let mut worker = SyncWorker::new(
        Arc::clone(&stack.orchestrator),
        stack.monitor.clone(),
        SyncWorkerConfig::default(),
    );
    let mut reports = worker.subscribe_reports();
    worker.start().expect("worker starts");

    stack.monitor.set_reachable(true);

    let report = tokio::time::timeout(Duration::from_secs(3), reports.recv())
        .await
        .expect("report arrives")
        .expect("broadcast open");
    assert_eq!(report.succeeded, 1);
    assert_eq!(stack.actions.depth().await.unwrap(), 0);

    worker.stop().await.expect("worker stops");
}

#[tokio::test(flavor = "multi_thread")]
async fn read_path_prefers_remote_when_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/workouts"))
        .and(query_param("date", "2025-03-10"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(remote_workout("srv-2", WorkoutStatus::InProgress)),
        )
        .mount(&server)
        .await;

    let stack = build_stack(&server, true);

    let record = stack
        .service
        .current_session(session_date())
        .await
        .expect("read succeeds")
        .expect("session found");

    assert!(!record.is_offline());
    assert_eq!(record.workout().id, "srv-2");
}

#[tokio::test(flavor = "multi_thread")]
async fn drain_is_refused_while_unreachable() {
    let server = MockServer::start().await;
    let stack = build_stack(&server, false);

    stack.service.delete("w-1").await.expect("offline delete queues");

    let attempt = stack.orchestrator.sync_now().await.expect("drain call succeeds");
    assert!(matches!(
        attempt,
        SyncAttempt::Skipped(flexlog_domain::SkipReason::Unreachable)
    ));
    assert_eq!(stack.actions.depth().await.unwrap(), 1, "nothing was consumed");
}
