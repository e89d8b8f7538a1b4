//! Offline-aware repository facade for workout mutations.
//!
//! Single entry point for create/update/delete. Routes to the remote store
//! when reachable, to the local durable store otherwise, and returns the same
//! shape on both paths so callers never branch on connectivity. Queuing an
//! action offline is a success from the caller's point of view, not an error.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use flexlog_domain::{
    ActionPayload, FlexLogError, OfflineWorkout, PendingAction, QueueConfig, RecordOrigin, Result,
    Workout, WorkoutDraft, WorkoutPatch, WorkoutRecord, WorkoutStatus,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::sync::ports::{ActionLog, OfflineWorkoutCache, Reachability, RemoteWorkoutStore};

/// Offline-aware workout repository.
pub struct WorkoutService {
    remote: Arc<dyn RemoteWorkoutStore>,
    actions: Arc<dyn ActionLog>,
    cache: Arc<dyn OfflineWorkoutCache>,
    reachability: Arc<dyn Reachability>,
    limits: QueueConfig,
}

impl WorkoutService {
    /// Create a facade over the given ports and queue limits.
    pub fn new(
        remote: Arc<dyn RemoteWorkoutStore>,
        actions: Arc<dyn ActionLog>,
        cache: Arc<dyn OfflineWorkoutCache>,
        reachability: Arc<dyn Reachability>,
        limits: QueueConfig,
    ) -> Self {
        Self { remote, actions, cache, reachability, limits }
    }

    /// Create a workout. Remote-path errors propagate unchanged; the offline
    /// path materializes the entity locally and queues a single create.
    #[instrument(skip(self, draft), fields(date = %draft.workout_date))]
    pub async fn create(&self, draft: WorkoutDraft) -> Result<WorkoutRecord> {
        if self.reachability.is_reachable() {
            let workout = self.remote.create(&draft).await?;
            return Ok(WorkoutRecord::Confirmed(workout));
        }

        // One in-progress session per day: a second offline create for the
        // same date is a caller mistake, not a new session.
        if self.cache.get_by_date(draft.workout_date).await?.is_some() {
            return Err(FlexLogError::InvalidInput(format!(
                "a workout for {} already exists locally",
                draft.workout_date
            )));
        }

        let local_id = format!("local-{}", Uuid::new_v4());
        let now = Utc::now().timestamp();

        // Queue first: a refused enqueue (cap reached) must leave no local
        // state behind. A queued create without a cache entry replays fine
        // from its own payload.
        self.enqueue_guarded(ActionPayload::Create {
            local_id: local_id.clone(),
            draft: draft.clone(),
        })
        .await?;
        let entry = OfflineWorkout {
            local_id: local_id.clone(),
            origin: RecordOrigin::Local,
            data: draft.materialize(local_id, now),
        };
        self.cache.put(&entry).await?;

        info!(local_id = %entry.local_id, "workout saved locally; will sync when reachable");
        Ok(WorkoutRecord::Pending(entry))
    }

    /// Update a workout. Offline updates of an entity that exists only
    /// locally mutate it in place without queuing a second action chain; the
    /// original queued create drains with the latest data.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: WorkoutPatch) -> Result<WorkoutRecord> {
        if self.reachability.is_reachable() {
            let workout = self.remote.update(id, &patch).await?;
            return Ok(WorkoutRecord::Confirmed(workout));
        }

        let now = Utc::now().timestamp();
        match self.cache.get(id).await? {
            Some(mut entry) => {
                if entry.origin == RecordOrigin::Remote {
                    // Shadow of a remote-confirmed entity: the drain needs an
                    // explicit update action for it.
                    self.enqueue_guarded(ActionPayload::Update {
                        id: id.to_string(),
                        patch: patch.clone(),
                    })
                    .await?;
                } else {
                    debug!(local_id = %id, "offline-only entity updated in place");
                }
                entry.data.apply_patch(&patch, now);
                self.cache.put(&entry).await?;
                Ok(WorkoutRecord::Pending(entry))
            }
            None => {
                // Remote-confirmed entity edited offline for the first time:
                // shadow it locally so reads see the edit, and queue the
                // update for the drain.
                self.enqueue_guarded(ActionPayload::Update {
                    id: id.to_string(),
                    patch: patch.clone(),
                })
                .await?;
                let entry = OfflineWorkout {
                    local_id: id.to_string(),
                    origin: RecordOrigin::Remote,
                    data: shadow_from_patch(id, &patch, now),
                };
                self.cache.put(&entry).await?;
                Ok(WorkoutRecord::Pending(entry))
            }
        }
    }

    /// Delete a workout. The offline path evicts any local entry and queues a
    /// delete; a queued create followed by this delete replays in enqueue
    /// order, leaving no orphaned remote record.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.reachability.is_reachable() {
            return self.remote.delete(id).await;
        }

        self.enqueue_guarded(ActionPayload::Delete { id: id.to_string() }).await?;
        self.cache.remove(id).await?;
        info!(id = %id, "delete queued for next sync");
        Ok(())
    }

    /// Read the current session for a date, merging sources: a
    /// remote-confirmed workout is authoritative; otherwise the offline cache
    /// answers.
    #[instrument(skip(self))]
    pub async fn current_session(&self, date: NaiveDate) -> Result<Option<WorkoutRecord>> {
        if self.reachability.is_reachable() {
            if let Some(workout) = self.remote.fetch_by_date(date).await? {
                return Ok(Some(WorkoutRecord::Confirmed(workout)));
            }
        }
        Ok(self.cache.get_by_date(date).await?.map(WorkoutRecord::Pending))
    }

    /// User-initiated reset: empty both local collections. Never called by
    /// the sync engine.
    pub async fn reset_local(&self) -> Result<()> {
        self.actions.clear().await?;
        self.cache.clear().await?;
        info!("local durable store reset");
        Ok(())
    }

    async fn enqueue_guarded(&self, payload: ActionPayload) -> Result<PendingAction> {
        let depth = self.actions.depth().await?;
        if depth >= self.limits.max_pending_actions {
            return Err(FlexLogError::StorageFull(format!(
                "pending action log at capacity ({depth} queued)"
            )));
        }
        if depth >= self.limits.warn_pending_actions {
            warn!(
                depth,
                cap = self.limits.max_pending_actions,
                "pending action log nearing capacity"
            );
        }

        let action = PendingAction::new(payload);
        self.actions.enqueue(&action).await?;
        Ok(action)
    }
}

/// Best-effort local materialization of a patch against an unseen remote
/// entity. Only the read path consumes this; the drain sends the raw patch.
fn shadow_from_patch(id: &str, patch: &WorkoutPatch, now: i64) -> Workout {
    Workout {
        id: id.to_string(),
        workout_date: patch.workout_date.unwrap_or_else(|| Utc::now().date_naive()),
        exercises: patch.exercises.clone().unwrap_or_default(),
        notes: patch.notes.clone(),
        status: patch.status.unwrap_or(WorkoutStatus::InProgress),
        created_at: now,
        updated_at: now,
    }
}
