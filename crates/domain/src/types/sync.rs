//! Sync engine types: pending actions, id mappings, and drain reports.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::FlexLogError;
use crate::types::workout::{WorkoutDraft, WorkoutPatch};

/// Kind of a queued mutation intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for ActionKind {
    type Err = FlexLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(FlexLogError::InvalidInput(format!("unknown action kind: {other}"))),
        }
    }
}

/// The operation input carried by a pending action.
///
/// `Create` keeps the local identifier so the drain can bridge it to the
/// remote identifier space once the create lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ActionPayload {
    Create { local_id: String, draft: WorkoutDraft },
    Update { id: String, patch: WorkoutPatch },
    Delete { id: String },
}

impl ActionPayload {
    /// The action kind this payload dispatches to.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Create { .. } => ActionKind::Create,
            Self::Update { .. } => ActionKind::Update,
            Self::Delete { .. } => ActionKind::Delete,
        }
    }

    /// The logical identifier the action targets.
    pub fn target_id(&self) -> &str {
        match self {
            Self::Create { local_id, .. } => local_id,
            Self::Update { id, .. } => id,
            Self::Delete { id } => id,
        }
    }
}

/// A mutation intent that could not be applied remotely yet.
///
/// Never mutated in place: the drain removes it only after the remote store
/// confirms the corresponding operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: String,
    pub kind: ActionKind,
    pub payload: ActionPayload,
    pub enqueued_at: i64,
}

impl PendingAction {
    /// Create a new action with a generated identifier and enqueue timestamp.
    pub fn new(payload: ActionPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: payload.kind(),
            payload,
            enqueued_at: Utc::now().timestamp(),
        }
    }
}

/// Bridge between a locally generated identifier and the remote identifier
/// assigned when the create landed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdMapping {
    pub local_id: String,
    pub remote_id: String,
    pub created_at: i64,
}

impl IdMapping {
    pub fn new(local_id: impl Into<String>, remote_id: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            remote_id: remote_id.into(),
            created_at: Utc::now().timestamp(),
        }
    }
}

/// Why a requested drain did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The remote store is not currently callable.
    Unreachable,
    /// An earlier drain is still in flight.
    AlreadyRunning,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "remote store unreachable"),
            Self::AlreadyRunning => write!(f, "drain already in flight"),
        }
    }
}

/// Outcome of a requested drain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncAttempt {
    Completed(SyncReport),
    Skipped(SkipReason),
}

/// Aggregate drain outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// Both collections were empty; nothing to do.
    Nothing,
    AllSynced,
    Partial,
    Failed,
}

/// Per-drain bookkeeping: counts only, never a hard failure for partial
/// success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub succeeded: u32,
    pub failed: u32,
}

impl SyncReport {
    pub fn outcome(&self) -> SyncOutcome {
        match (self.succeeded, self.failed) {
            (0, 0) => SyncOutcome::Nothing,
            (_, 0) => SyncOutcome::AllSynced,
            (0, _) => SyncOutcome::Failed,
            _ => SyncOutcome::Partial,
        }
    }

    /// User-facing one-liner for the notification surface.
    pub fn summary(&self) -> String {
        match self.outcome() {
            SyncOutcome::Nothing => "nothing to sync".to_string(),
            SyncOutcome::AllSynced => format!("all {} items synced", self.succeeded),
            SyncOutcome::Partial => format!("{} synced, {} failed", self.succeeded, self.failed),
            SyncOutcome::Failed => "sync failed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::workout::WorkoutStatus;

    fn sample_draft() -> WorkoutDraft {
        WorkoutDraft {
            workout_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            exercises: Vec::new(),
            notes: Some("morning session".to_string()),
            status: WorkoutStatus::InProgress,
        }
    }

    #[test]
    fn action_kind_round_trips_through_str() {
        for kind in [ActionKind::Create, ActionKind::Update, ActionKind::Delete] {
            let parsed: ActionKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("upsert".parse::<ActionKind>().is_err());
    }

    #[test]
    fn payload_reports_kind_and_target() {
        let create =
            ActionPayload::Create { local_id: "local-1".to_string(), draft: sample_draft() };
        let update = ActionPayload::Update { id: "w-2".to_string(), patch: WorkoutPatch::default() };
        let delete = ActionPayload::Delete { id: "w-3".to_string() };

        assert_eq!(create.kind(), ActionKind::Create);
        assert_eq!(create.target_id(), "local-1");
        assert_eq!(update.kind(), ActionKind::Update);
        assert_eq!(update.target_id(), "w-2");
        assert_eq!(delete.kind(), ActionKind::Delete);
        assert_eq!(delete.target_id(), "w-3");
    }

    #[test]
    fn pending_action_derives_kind_from_payload() {
        let action = PendingAction::new(ActionPayload::Delete { id: "w-9".to_string() });

        assert_eq!(action.kind, ActionKind::Delete);
        assert!(!action.id.is_empty());
        assert!(action.enqueued_at > 0);
    }

    #[test]
    fn pending_action_serialization_round_trips() {
        let action = PendingAction::new(ActionPayload::Create {
            local_id: "local-7".to_string(),
            draft: sample_draft(),
        });

        let serialized = serde_json::to_string(&action).unwrap();
        let deserialized: PendingAction = serde_json::from_str(&serialized).unwrap();

        assert_eq!(action, deserialized);
    }

    #[test]
    fn report_classifies_outcomes() {
        assert_eq!(SyncReport::default().outcome(), SyncOutcome::Nothing);
        assert_eq!(SyncReport { succeeded: 3, failed: 0 }.outcome(), SyncOutcome::AllSynced);
        assert_eq!(SyncReport { succeeded: 4, failed: 1 }.outcome(), SyncOutcome::Partial);
        assert_eq!(SyncReport { succeeded: 0, failed: 2 }.outcome(), SyncOutcome::Failed);
    }

    #[test]
    fn report_summaries_match_notification_surface() {
        assert_eq!(SyncReport::default().summary(), "nothing to sync");
        assert_eq!(SyncReport { succeeded: 3, failed: 0 }.summary(), "all 3 items synced");
        assert_eq!(SyncReport { succeeded: 4, failed: 1 }.summary(), "4 synced, 1 failed");
        assert_eq!(SyncReport { succeeded: 0, failed: 2 }.summary(), "sync failed");
    }
}
