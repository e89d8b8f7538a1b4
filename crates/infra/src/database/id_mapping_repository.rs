//! SQLite-backed implementation of the id mapping port.
//!
//! Maps locally generated workout identifiers to the remote-assigned ones
//! recorded when a queued create lands.

use std::sync::Arc;

use async_trait::async_trait;
use flexlog_core::IdMappingRepository;
use flexlog_domain::{IdMapping, Result};
use rusqlite::params;
use tokio::task;

use super::manager::DbManager;
use super::{map_join_error, map_sql_error};

/// SQLite-backed id mapping repository.
pub struct SqliteIdMappingRepository {
    db: Arc<DbManager>,
}

impl SqliteIdMappingRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdMappingRepository for SqliteIdMappingRepository {
    async fn record(&self, mapping: &IdMapping) -> Result<()> {
        let db = Arc::clone(&self.db);
        let mapping = mapping.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            // A replayed create for the same local id overwrites with the
            // same remote id, so REPLACE keeps the operation idempotent.
            conn.execute(
                "INSERT OR REPLACE INTO id_mappings (local_id, remote_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![mapping.local_id, mapping.remote_id, mapping.created_at],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn resolve(&self, local_id: &str) -> Result<Option<String>> {
        let db = Arc::clone(&self.db);
        let local_id = local_id.to_string();

        task::spawn_blocking(move || -> Result<Option<String>> {
            let conn = db.get_connection()?;
            match conn.query_row(
                "SELECT remote_id FROM id_mappings WHERE local_id = ?1",
                params![local_id],
                |row| row.get(0),
            ) {
                Ok(remote_id) => Ok(Some(remote_id)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn setup_repository() -> (SqliteIdMappingRepository, Arc<DbManager>, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("mappings.db");

        let manager = Arc::new(DbManager::new(&db_path, 4).expect("manager created"));
        manager.run_migrations().expect("migrations run");

        let repo = SqliteIdMappingRepository::new(Arc::clone(&manager));
        (repo, manager, temp_dir)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn record_then_resolve_returns_remote_id() {
        let (repo, _manager, _dir) = setup_repository().await;

        repo.record(&IdMapping::new("local-1", "remote-1")).await.expect("record succeeds");

        let remote = repo.resolve("local-1").await.expect("resolve succeeds");
        assert_eq!(remote.as_deref(), Some("remote-1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_of_unknown_local_id_returns_none() {
        let (repo, _manager, _dir) = setup_repository().await;

        let remote = repo.resolve("local-unknown").await.expect("resolve succeeds");
        assert!(remote.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn recording_twice_is_idempotent() {
        let (repo, _manager, _dir) = setup_repository().await;

        repo.record(&IdMapping::new("local-1", "remote-1")).await.expect("first record");
        repo.record(&IdMapping::new("local-1", "remote-1")).await.expect("second record");

        let remote = repo.resolve("local-1").await.expect("resolve succeeds");
        assert_eq!(remote.as_deref(), Some("remote-1"));
    }
}
