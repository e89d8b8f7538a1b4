//! Workout entity types shared across the facade, orchestrator, and stores.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::FlexLogError;

/// A single set within an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub reps: u32,
    pub weight_kg: Option<f64>,
}

/// An exercise with its recorded sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: Vec<SetEntry>,
}

/// Lifecycle status of a workout session.
///
/// The remote contract distinguishes "object exists" from "object is in
/// terminal state", so `Completed` is always set via a follow-up update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    InProgress,
    Completed,
}

impl fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for WorkoutStatus {
    type Err = FlexLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(FlexLogError::InvalidInput(format!("unknown workout status: {other}"))),
        }
    }
}

/// A workout record. The `id` is remote-assigned for confirmed records and
/// locally generated for records created while unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub workout_date: NaiveDate,
    pub exercises: Vec<Exercise>,
    pub notes: Option<String>,
    pub status: WorkoutStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Workout {
    /// Apply a partial update in place (last-write-wins per field).
    pub fn apply_patch(&mut self, patch: &WorkoutPatch, now: i64) {
        if let Some(date) = patch.workout_date {
            self.workout_date = date;
        }
        if let Some(exercises) = &patch.exercises {
            self.exercises = exercises.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

/// Input for creating a workout; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDraft {
    pub workout_date: NaiveDate,
    pub exercises: Vec<Exercise>,
    pub notes: Option<String>,
    #[serde(default = "default_draft_status")]
    pub status: WorkoutStatus,
}

fn default_draft_status() -> WorkoutStatus {
    WorkoutStatus::InProgress
}

impl WorkoutDraft {
    /// Materialize the draft into a full record under the given identifier.
    pub fn materialize(&self, id: impl Into<String>, now: i64) -> Workout {
        Workout {
            id: id.into(),
            workout_date: self.workout_date,
            exercises: self.exercises.clone(),
            notes: self.notes.clone(),
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Workout> for WorkoutDraft {
    fn from(workout: &Workout) -> Self {
        Self {
            workout_date: workout.workout_date,
            exercises: workout.exercises.clone(),
            notes: workout.notes.clone(),
            status: workout.status,
        }
    }
}

/// Partial update for a workout. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPatch {
    pub workout_date: Option<NaiveDate>,
    pub exercises: Option<Vec<Exercise>>,
    pub notes: Option<String>,
    pub status: Option<WorkoutStatus>,
}

/// Where a locally cached record originated.
///
/// `Local` entries were created while unreachable and still need a remote
/// `create`; `Remote` entries shadow an already-confirmed record that was
/// edited offline and must never be re-created during a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    Local,
    Remote,
}

impl fmt::Display for RecordOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for RecordOrigin {
    type Err = FlexLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(FlexLogError::InvalidInput(format!("unknown record origin: {other}"))),
        }
    }
}

/// A workout materialized locally and not yet confirmed by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineWorkout {
    pub local_id: String,
    pub origin: RecordOrigin,
    pub data: Workout,
}

/// Read-path result: callers pattern-match instead of inspecting an ad-hoc
/// `offline` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkoutRecord {
    Confirmed(Workout),
    Pending(OfflineWorkout),
}

impl WorkoutRecord {
    /// The workout data regardless of confirmation state.
    pub fn workout(&self) -> &Workout {
        match self {
            Self::Confirmed(workout) => workout,
            Self::Pending(offline) => &offline.data,
        }
    }

    /// True when the record has not been confirmed by the remote store.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}
