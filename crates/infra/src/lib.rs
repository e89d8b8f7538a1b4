//! # FlexLog Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - SQLite-backed durable store (action log, offline cache, id mappings)
//! - HTTP remote workout store
//! - Reachability monitor
//! - Background sync worker and configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `flexlog-core`
//! - Depends on `flexlog-domain` and `flexlog-core`
//! - Contains all "impure" code (I/O, network, clocks)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod reachability;
pub mod sync;

pub use database::{
    DbManager, SqliteActionLogRepository, SqliteIdMappingRepository, SqliteOfflineWorkoutRepository,
};
pub use http::HttpClient;
pub use reachability::ReachabilityMonitor;
pub use sync::{HttpRemoteStore, SyncWorker, SyncWorkerConfig};
