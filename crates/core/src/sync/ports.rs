//! Port interfaces for the offline durability and sync engine

use async_trait::async_trait;
use chrono::NaiveDate;
use flexlog_domain::{
    IdMapping, OfflineWorkout, PendingAction, Result, Workout, WorkoutDraft, WorkoutPatch,
};
use tokio::sync::watch;

/// Trait for the persistent pending action log.
///
/// The log is strict FIFO: `list` returns enqueue order and the drain never
/// reorders or coalesces entries.
#[async_trait]
pub trait ActionLog: Send + Sync {
    /// Append an action at the tail of the log, persisted before returning.
    async fn enqueue(&self, action: &PendingAction) -> Result<()>;

    /// Remove exactly one action by identifier; no-op if absent.
    async fn dequeue(&self, id: &str) -> Result<()>;

    /// Current log contents in FIFO enqueue order.
    async fn list(&self) -> Result<Vec<PendingAction>>;

    /// Number of queued actions.
    async fn depth(&self) -> Result<usize>;

    /// Empty the log. User-initiated reset only, never called by the drain.
    async fn clear(&self) -> Result<()>;
}

/// Trait for the persistent cache of locally materialized workouts.
#[async_trait]
pub trait OfflineWorkoutCache: Send + Sync {
    /// Insert or replace an entry (last-write-wins per key).
    async fn put(&self, entry: &OfflineWorkout) -> Result<()>;

    /// Fetch an entry by local identifier.
    async fn get(&self, local_id: &str) -> Result<Option<OfflineWorkout>>;

    /// Fetch the entry for a given session date, if any.
    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<OfflineWorkout>>;

    /// Locally-originated entries whose status is terminal, in update order.
    /// Remote-backed shadows are excluded; they must never be re-created.
    async fn list_completed(&self) -> Result<Vec<OfflineWorkout>>;

    /// Remove an entry by local identifier; no-op if absent.
    async fn remove(&self, local_id: &str) -> Result<()>;

    /// Empty the cache. User-initiated reset only.
    async fn clear(&self) -> Result<()>;
}

/// Trait for bridging local identifiers to remote-assigned ones.
#[async_trait]
pub trait IdMappingRepository: Send + Sync {
    /// Record a new local→remote mapping.
    async fn record(&self, mapping: &IdMapping) -> Result<()>;

    /// Resolve the remote identifier for a local one, if the create landed.
    async fn resolve(&self, local_id: &str) -> Result<Option<String>>;
}

/// Trait for the remote workout store (external collaborator).
///
/// Calls may fail transiently (network) or permanently (validation); the
/// drain only distinguishes success from failure.
#[async_trait]
pub trait RemoteWorkoutStore: Send + Sync {
    /// Create a workout; the store assigns the identifier.
    async fn create(&self, draft: &WorkoutDraft) -> Result<Workout>;

    /// Partially update a workout by identifier.
    async fn update(&self, id: &str, patch: &WorkoutPatch) -> Result<Workout>;

    /// Delete a workout by identifier.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Fetch the workout for a session date, if one exists.
    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Option<Workout>>;
}

/// Trait for the host environment's connectivity signal.
///
/// The subscription fires exactly once per transition, never on repeated
/// identical states. This component cannot fail, only report a possibly
/// stale snapshot.
pub trait Reachability: Send + Sync {
    /// Current snapshot of remote-store reachability.
    fn is_reachable(&self) -> bool;

    /// Subscribe to reachability transitions.
    fn subscribe(&self) -> watch::Receiver<bool>;
}
