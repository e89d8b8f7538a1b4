//! Application configuration structures
//!
//! Plain data; loading (env/file probing) lives in `flexlog-infra`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DB_POOL_SIZE, DEFAULT_MAX_PENDING_ACTIONS, DEFAULT_REMOTE_TIMEOUT_SECS,
    DEFAULT_WARN_PENDING_ACTIONS,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub queue: QueueConfig,
}

/// Local durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "flexlog.db".to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

/// Remote store endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL for the workout API (e.g., "https://api.flexlog.app")
    pub base_url: String,
    /// Timeout for remote requests in seconds
    pub timeout_seconds: u64,
    /// Bearer token for the workout API
    pub api_token: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.flexlog.app".to_string(),
            timeout_seconds: DEFAULT_REMOTE_TIMEOUT_SECS,
            api_token: None,
        }
    }
}

/// Pending action log limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Hard cap; enqueues past this are refused with `StorageFull`
    pub max_pending_actions: usize,
    /// Soft threshold; enqueues past this log a warning
    pub warn_pending_actions: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_pending_actions: DEFAULT_MAX_PENDING_ACTIONS,
            warn_pending_actions: DEFAULT_WARN_PENDING_ACTIONS,
        }
    }
}

impl QueueConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_pending_actions == 0 {
            return Err("max_pending_actions must be greater than 0".to_string());
        }
        if self.warn_pending_actions > self.max_pending_actions {
            return Err("warn_pending_actions cannot exceed max_pending_actions".to_string());
        }
        Ok(())
    }
}
