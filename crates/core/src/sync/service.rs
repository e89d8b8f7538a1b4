//! Sync orchestrator: drains the pending action log and migrates offline
//! workouts once the remote store becomes reachable.
//!
//! One `sync_now` call is one drain pass. At most one drain runs at a time;
//! re-triggers while a pass is in flight are skipped, not queued. Confirmed
//! actions are dequeued before the next pass begins, which is what makes
//! re-drains idempotent; there is no server-side deduplication to lean on.

use std::sync::Arc;

use flexlog_domain::{
    ActionPayload, IdMapping, OfflineWorkout, PendingAction, Result, SkipReason, SyncAttempt,
    SyncReport, WorkoutDraft, WorkoutPatch, WorkoutStatus,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::sync::ports::{
    ActionLog, IdMappingRepository, OfflineWorkoutCache, Reachability, RemoteWorkoutStore,
};

/// What a drain pass should do with one queued action.
enum ActionDisposition {
    /// A remote call was confirmed; dequeue and count it.
    Applied,
    /// Already satisfied by an earlier migration; dequeue without counting.
    Satisfied,
    /// Owned by phase 1 of a later pass; leave it queued and uncounted.
    Deferred,
}

/// Orchestrates reconnection drains over the injected ports.
///
/// Owns no storage: the local durable store is accessed read/drain-only, and
/// every remote call is sequential to preserve enqueue ordering.
pub struct SyncOrchestrator {
    actions: Arc<dyn ActionLog>,
    cache: Arc<dyn OfflineWorkoutCache>,
    mappings: Arc<dyn IdMappingRepository>,
    remote: Arc<dyn RemoteWorkoutStore>,
    reachability: Arc<dyn Reachability>,
    drain_lock: Mutex<()>,
    invalidation: watch::Sender<u64>,
}

impl SyncOrchestrator {
    /// Create an orchestrator over the given ports.
    pub fn new(
        actions: Arc<dyn ActionLog>,
        cache: Arc<dyn OfflineWorkoutCache>,
        mappings: Arc<dyn IdMappingRepository>,
        remote: Arc<dyn RemoteWorkoutStore>,
        reachability: Arc<dyn Reachability>,
    ) -> Self {
        let (invalidation, _) = watch::channel(0);
        Self { actions, cache, mappings, remote, reachability, drain_lock: Mutex::new(()), invalidation }
    }

    /// Subscribe to the cache-invalidation generation. The value is bumped
    /// after any drain that confirmed at least one item, signalling readers
    /// to re-fetch current state from the remote store.
    pub fn subscribe_invalidation(&self) -> watch::Receiver<u64> {
        self.invalidation.subscribe()
    }

    /// Run one drain pass.
    ///
    /// Skips (without error) when unreachable or when an earlier pass is
    /// still in flight. Partial failure is reported through the aggregate
    /// counts, never as a hard error.
    #[instrument(skip(self))]
    pub async fn sync_now(&self) -> Result<SyncAttempt> {
        let _guard = match self.drain_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("drain already in flight; ignoring trigger");
                return Ok(SyncAttempt::Skipped(SkipReason::AlreadyRunning));
            }
        };

        if !self.reachability.is_reachable() {
            debug!("remote store unreachable; drain refused");
            return Ok(SyncAttempt::Skipped(SkipReason::Unreachable));
        }

        // Snapshot both collections up front; anything enqueued after this
        // point waits for the next trigger.
        let finalized = self.cache.list_completed().await?;
        let queued = self.actions.list().await?;

        if finalized.is_empty() && queued.is_empty() {
            debug!("nothing to sync");
            return Ok(SyncAttempt::Completed(SyncReport::default()));
        }

        info!(entities = finalized.len(), actions = queued.len(), "starting drain");
        let mut report = SyncReport::default();

        // Phase 1: migrate offline-finalized workouts into the remote
        // identifier space before any queued action references them.
        for entry in &finalized {
            if !self.reachability.is_reachable() {
                warn!("reachability lost mid-drain; remaining entities stay queued");
                break;
            }
            match self.migrate_finalized(entry).await {
                Ok(true) => report.succeeded += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        local_id = %entry.local_id,
                        error = %err,
                        "offline workout migration failed; continuing with next item"
                    );
                    report.failed += 1;
                }
            }
        }

        // Phase 2: drain the action log in FIFO order. No in-pass retry;
        // failures stay queued for the next trigger.
        for action in &queued {
            if !self.reachability.is_reachable() {
                warn!("reachability lost mid-drain; remaining actions stay queued");
                break;
            }
            match self.apply_action(action).await {
                Ok(ActionDisposition::Applied) => {
                    self.actions.dequeue(&action.id).await?;
                    report.succeeded += 1;
                }
                Ok(ActionDisposition::Satisfied) => {
                    self.actions.dequeue(&action.id).await?;
                }
                Ok(ActionDisposition::Deferred) => {}
                Err(err) => {
                    warn!(
                        action_id = %action.id,
                        kind = %action.kind,
                        error = %err,
                        "queued action failed; left queued for next sync"
                    );
                    report.failed += 1;
                }
            }
        }

        if report.succeeded > 0 {
            self.invalidation.send_modify(|generation| *generation += 1);
        }

        info!(succeeded = report.succeeded, failed = report.failed, "drain finished");
        Ok(SyncAttempt::Completed(report))
    }

    /// Mirror one offline-finalized workout remotely: `create` with its data,
    /// then a second call to set the terminal status. The mapping is recorded
    /// between the two calls so a failed finalize is retried on the next pass
    /// without duplicating the create.
    async fn migrate_finalized(&self, entry: &OfflineWorkout) -> Result<bool> {
        let finalize = WorkoutPatch {
            status: Some(WorkoutStatus::Completed),
            ..WorkoutPatch::default()
        };

        let remote_id = match self.mappings.resolve(&entry.local_id).await? {
            Some(remote_id) => {
                debug!(local_id = %entry.local_id, "create already mirrored; retrying finalize");
                remote_id
            }
            None => {
                let mut draft = WorkoutDraft::from(&entry.data);
                draft.status = WorkoutStatus::InProgress;
                let created = self.remote.create(&draft).await?;
                self.mappings
                    .record(&IdMapping::new(entry.local_id.clone(), created.id.clone()))
                    .await?;
                created.id
            }
        };

        self.remote.update(&remote_id, &finalize).await?;
        self.cache.remove(&entry.local_id).await?;
        Ok(true)
    }

    /// Dispatch one queued action to the remote store.
    async fn apply_action(&self, action: &PendingAction) -> Result<ActionDisposition> {
        match &action.payload {
            ActionPayload::Create { local_id, draft } => {
                if self.mappings.resolve(local_id).await?.is_some() {
                    debug!(local_id = %local_id, "create already satisfied by migration");
                    return Ok(ActionDisposition::Satisfied);
                }
                // Offline edits made after the create was queued live in the
                // cache; fold them into the create instead of replaying them.
                let draft = match self.cache.get(local_id).await? {
                    Some(entry) => {
                        if entry.data.status == WorkoutStatus::Completed {
                            // Finalized entities belong to phase 1, which
                            // mirrors them with the create-then-finalize
                            // sequence. Retrying its failed create here would
                            // be a second attempt within the same pass.
                            debug!(
                                local_id = %local_id,
                                "finalized entity awaits migration; create left queued"
                            );
                            return Ok(ActionDisposition::Deferred);
                        }
                        WorkoutDraft::from(&entry.data)
                    }
                    None => draft.clone(),
                };
                let created = self.remote.create(&draft).await?;
                self.mappings
                    .record(&IdMapping::new(local_id.clone(), created.id.clone()))
                    .await?;
                self.cache.remove(local_id).await?;
                Ok(ActionDisposition::Applied)
            }
            ActionPayload::Update { id, patch } => {
                let target = self.resolve_target(id).await?;
                self.remote.update(&target, patch).await?;
                self.cache.remove(id).await?;
                Ok(ActionDisposition::Applied)
            }
            ActionPayload::Delete { id } => {
                let target = self.resolve_target(id).await?;
                self.remote.delete(&target).await?;
                self.cache.remove(id).await?;
                Ok(ActionDisposition::Applied)
            }
        }
    }

    /// Map a queued target through the id bridge; ids with no mapping are
    /// assumed to already be remote identifiers.
    async fn resolve_target(&self, id: &str) -> Result<String> {
        Ok(self.mappings.resolve(id).await?.unwrap_or_else(|| id.to_string()))
    }
}
