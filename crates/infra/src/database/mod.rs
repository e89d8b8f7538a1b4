//! SQLite-backed durable store: connection manager and port repositories.

pub mod action_log_repository;
pub mod id_mapping_repository;
pub mod manager;
pub mod offline_workout_repository;

pub use action_log_repository::SqliteActionLogRepository;
pub use id_mapping_repository::SqliteIdMappingRepository;
pub use manager::DbManager;
pub use offline_workout_repository::SqliteOfflineWorkoutRepository;

use flexlog_domain::FlexLogError;
use tokio::task;

use crate::errors::InfraError;

pub(crate) fn map_sql_error(err: rusqlite::Error) -> FlexLogError {
    FlexLogError::from(InfraError::from(err))
}

pub(crate) fn map_join_error(err: task::JoinError) -> FlexLogError {
    if err.is_cancelled() {
        FlexLogError::Internal("blocking database task cancelled".into())
    } else {
        FlexLogError::Internal(format!("blocking database task failed: {err}"))
    }
}
