//! SQLite-backed implementation of the pending action log port.
//!
//! FIFO ordering comes from the `seq` AUTOINCREMENT column, not from
//! timestamps: two actions enqueued within the same second still drain in
//! enqueue order.

use std::sync::Arc;

use async_trait::async_trait;
use flexlog_core::ActionLog;
use flexlog_domain::{ActionKind, FlexLogError, PendingAction, Result};
use rusqlite::{params, Row};
use tokio::task;
use tracing::warn;

use super::manager::DbManager;
use super::{map_join_error, map_sql_error};

const ACTION_INSERT_SQL: &str = "INSERT INTO pending_actions (id, kind, payload_json, enqueued_at)
     VALUES (?1, ?2, ?3, ?4)";

const ACTION_LIST_SQL: &str = "SELECT id, kind, payload_json, enqueued_at
     FROM pending_actions
     ORDER BY seq ASC";

/// SQLite-backed pending action log.
pub struct SqliteActionLogRepository {
    db: Arc<DbManager>,
}

impl SqliteActionLogRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActionLog for SqliteActionLogRepository {
    async fn enqueue(&self, action: &PendingAction) -> Result<()> {
        let db = Arc::clone(&self.db);
        let action = action.clone();

        task::spawn_blocking(move || -> Result<()> {
            let payload_json = serde_json::to_string(&action.payload).map_err(|err| {
                FlexLogError::Internal(format!("failed to encode action payload: {err}"))
            })?;
            let conn = db.get_connection()?;
            conn.execute(
                ACTION_INSERT_SQL,
                params![action.id, action.kind.to_string(), payload_json, action.enqueued_at],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn dequeue(&self, id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            // Deleting an already-removed action is a no-op, which makes a
            // re-dequeue after crash recovery safe.
            conn.execute("DELETE FROM pending_actions WHERE id = ?1", params![id])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self) -> Result<Vec<PendingAction>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<PendingAction>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(ACTION_LIST_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], map_raw_action_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            let mut actions = Vec::with_capacity(rows.len());
            for raw in rows {
                match decode_action(&raw) {
                    Ok(action) => actions.push(action),
                    Err(err) => {
                        warn!(
                            action_id = %raw.id,
                            error = %err,
                            "skipping undecodable pending action row"
                        );
                    }
                }
            }
            Ok(actions)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn depth(&self) -> Result<usize> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM pending_actions", [], |row| row.get(0))
                .map_err(map_sql_error)?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn clear(&self) -> Result<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM pending_actions", []).map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

struct RawActionRow {
    id: String,
    kind: String,
    payload_json: String,
    enqueued_at: i64,
}

fn map_raw_action_row(row: &Row<'_>) -> rusqlite::Result<RawActionRow> {
    Ok(RawActionRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        payload_json: row.get(2)?,
        enqueued_at: row.get(3)?,
    })
}

fn decode_action(raw: &RawActionRow) -> Result<PendingAction> {
    let kind: ActionKind = raw.kind.parse()?;
    let payload = serde_json::from_str(&raw.payload_json).map_err(|err| {
        FlexLogError::StorageCorrupt(format!("undecodable action payload: {err}"))
    })?;
    Ok(PendingAction { id: raw.id.clone(), kind, payload, enqueued_at: raw.enqueued_at })
}

#[cfg(test)]
mod tests {
    use flexlog_domain::{ActionPayload, WorkoutPatch};
    use rusqlite::params;
    use tempfile::TempDir;

    use super::*;

    async fn setup_repository() -> (SqliteActionLogRepository, Arc<DbManager>, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("actions.db");

        let manager = Arc::new(DbManager::new(&db_path, 4).expect("manager created"));
        manager.run_migrations().expect("migrations run");

        let repo = SqliteActionLogRepository::new(Arc::clone(&manager));
        (repo, manager, temp_dir)
    }

    fn delete_action(id: &str) -> PendingAction {
        PendingAction::new(ActionPayload::Delete { id: id.to_string() })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn list_returns_actions_in_enqueue_order() {
        let (repo, _manager, _dir) = setup_repository().await;

        for target in ["w-1", "w-2", "w-3"] {
            repo.enqueue(&delete_action(target)).await.expect("enqueue succeeds");
        }

        let actions = repo.list().await.expect("list succeeds");
        let targets: Vec<&str> =
            actions.iter().map(|action| action.payload.target_id()).collect();
        assert_eq!(targets, vec!["w-1", "w-2", "w-3"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dequeue_removes_exactly_one_action() {
        let (repo, _manager, _dir) = setup_repository().await;

        let first = delete_action("w-1");
        let second = delete_action("w-2");
        repo.enqueue(&first).await.expect("enqueue succeeds");
        repo.enqueue(&second).await.expect("enqueue succeeds");

        repo.dequeue(&first.id).await.expect("dequeue succeeds");

        let actions = repo.list().await.expect("list succeeds");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].id, second.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dequeue_of_missing_action_is_a_noop() {
        let (repo, _manager, _dir) = setup_repository().await;

        repo.enqueue(&delete_action("w-1")).await.expect("enqueue succeeds");
        repo.dequeue("no-such-id").await.expect("dequeue of missing id succeeds");
        repo.dequeue("no-such-id").await.expect("repeated dequeue still succeeds");

        assert_eq!(repo.depth().await.expect("depth succeeds"), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn payload_round_trips_through_storage() {
        let (repo, _manager, _dir) = setup_repository().await;

        let action = PendingAction::new(ActionPayload::Update {
            id: "w-7".to_string(),
            patch: WorkoutPatch { notes: Some("pb attempt".to_string()), ..Default::default() },
        });
        repo.enqueue(&action).await.expect("enqueue succeeds");

        let actions = repo.list().await.expect("list succeeds");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0], action);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn log_survives_reopening_the_database() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("actions.db");

        {
            let manager = Arc::new(DbManager::new(&db_path, 4).expect("manager created"));
            manager.run_migrations().expect("migrations run");
            let repo = SqliteActionLogRepository::new(manager);
            for target in ["w-1", "w-2", "w-3"] {
                repo.enqueue(&delete_action(target)).await.expect("enqueue succeeds");
            }
        }

        // Fresh pool over the same file, as after a process restart.
        let manager = Arc::new(DbManager::new(&db_path, 4).expect("manager reopened"));
        manager.run_migrations().expect("migrations rerun");
        let repo = SqliteActionLogRepository::new(manager);

        let actions = repo.list().await.expect("list succeeds");
        let targets: Vec<&str> =
            actions.iter().map(|action| action.payload.target_id()).collect();
        assert_eq!(targets, vec!["w-1", "w-2", "w-3"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn corrupt_payload_rows_are_skipped() {
        let (repo, manager, _dir) = setup_repository().await;

        repo.enqueue(&delete_action("w-1")).await.expect("enqueue succeeds");
        {
            let conn = manager.get_connection().expect("connection acquired");
            conn.execute(
                "INSERT INTO pending_actions (id, kind, payload_json, enqueued_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params!["bad-row", "delete", "{not json", 1_700_000_000_i64],
            )
            .expect("raw insert succeeds");
        }

        let actions = repo.list().await.expect("list succeeds");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].payload.target_id(), "w-1");
        // Depth counts raw rows; the corrupt one still occupies a slot.
        assert_eq!(repo.depth().await.expect("depth succeeds"), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clear_empties_the_log() {
        let (repo, _manager, _dir) = setup_repository().await;

        repo.enqueue(&delete_action("w-1")).await.expect("enqueue succeeds");
        repo.enqueue(&delete_action("w-2")).await.expect("enqueue succeeds");

        repo.clear().await.expect("clear succeeds");

        assert_eq!(repo.depth().await.expect("depth succeeds"), 0);
        assert!(repo.list().await.expect("list succeeds").is_empty());
    }
}
