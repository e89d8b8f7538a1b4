//! SQLite-backed implementation of the offline workout cache port.
//!
//! Each row stores the full entity as JSON alongside the columns the read and
//! drain paths filter on (date, status, origin).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use flexlog_core::OfflineWorkoutCache;
use flexlog_domain::{FlexLogError, OfflineWorkout, RecordOrigin, Result, Workout};
use rusqlite::{params, Row};
use tokio::task;
use tracing::warn;

use super::manager::DbManager;
use super::{map_join_error, map_sql_error};

const WORKOUT_UPSERT_SQL: &str = "INSERT OR REPLACE INTO offline_workouts
     (local_id, workout_date, status, origin, payload_json, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const WORKOUT_SELECT_COLUMNS: &str = "local_id, origin, payload_json";

/// SQLite-backed offline workout cache.
pub struct SqliteOfflineWorkoutRepository {
    db: Arc<DbManager>,
}

impl SqliteOfflineWorkoutRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OfflineWorkoutCache for SqliteOfflineWorkoutRepository {
    async fn put(&self, entry: &OfflineWorkout) -> Result<()> {
        let db = Arc::clone(&self.db);
        let entry = entry.clone();

        task::spawn_blocking(move || -> Result<()> {
            let payload_json = serde_json::to_string(&entry.data).map_err(|err| {
                FlexLogError::Internal(format!("failed to encode cached workout: {err}"))
            })?;
            let conn = db.get_connection()?;
            conn.execute(
                WORKOUT_UPSERT_SQL,
                params![
                    entry.local_id,
                    entry.data.workout_date.to_string(),
                    entry.data.status.to_string(),
                    entry.origin.to_string(),
                    payload_json,
                    entry.data.updated_at,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, local_id: &str) -> Result<Option<OfflineWorkout>> {
        let db = Arc::clone(&self.db);
        let local_id = local_id.to_string();

        task::spawn_blocking(move || -> Result<Option<OfflineWorkout>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {WORKOUT_SELECT_COLUMNS} FROM offline_workouts WHERE local_id = ?1"
            );
            query_single(&conn, &sql, params![local_id])
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<OfflineWorkout>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<OfflineWorkout>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {WORKOUT_SELECT_COLUMNS} FROM offline_workouts
                 WHERE workout_date = ?1
                 ORDER BY updated_at DESC
                 LIMIT 1"
            );
            query_single(&conn, &sql, params![date.to_string()])
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_completed(&self) -> Result<Vec<OfflineWorkout>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<OfflineWorkout>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {WORKOUT_SELECT_COLUMNS} FROM offline_workouts
                 WHERE origin = 'local' AND status = 'completed'
                 ORDER BY updated_at ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], map_raw_workout_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            let mut entries = Vec::with_capacity(rows.len());
            for raw in rows {
                match decode_workout(&raw) {
                    Ok(entry) => entries.push(entry),
                    Err(err) => {
                        warn!(
                            local_id = %raw.local_id,
                            error = %err,
                            "skipping undecodable offline workout row"
                        );
                    }
                }
            }
            Ok(entries)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove(&self, local_id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let local_id = local_id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM offline_workouts WHERE local_id = ?1", params![local_id])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn clear(&self) -> Result<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM offline_workouts", []).map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

struct RawWorkoutRow {
    local_id: String,
    origin: String,
    payload_json: String,
}

fn map_raw_workout_row(row: &Row<'_>) -> rusqlite::Result<RawWorkoutRow> {
    Ok(RawWorkoutRow { local_id: row.get(0)?, origin: row.get(1)?, payload_json: row.get(2)? })
}

fn decode_workout(raw: &RawWorkoutRow) -> Result<OfflineWorkout> {
    let origin: RecordOrigin = raw.origin.parse()?;
    let data: Workout = serde_json::from_str(&raw.payload_json).map_err(|err| {
        FlexLogError::StorageCorrupt(format!("undecodable cached workout: {err}"))
    })?;
    Ok(OfflineWorkout { local_id: raw.local_id.clone(), origin, data })
}

fn query_single(
    conn: &rusqlite::Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<OfflineWorkout>> {
    match conn.query_row(sql, params, map_raw_workout_row) {
        Ok(raw) => decode_workout(&raw).map(Some),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) => Err(map_sql_error(err)),
    }
}
