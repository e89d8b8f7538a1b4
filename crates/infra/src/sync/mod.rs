//! Sync infrastructure: the HTTP remote store adapter and the background
//! worker that drives drains off reachability transitions.

pub mod remote_client;
pub mod worker;

pub use remote_client::HttpRemoteStore;
pub use worker::{SyncWorker, SyncWorkerConfig};
