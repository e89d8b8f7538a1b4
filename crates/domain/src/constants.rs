//! Domain constants

/// Hard cap on the pending action log; enqueues past this fail with
/// `StorageFull`.
pub const DEFAULT_MAX_PENDING_ACTIONS: usize = 1_000;

/// Soft threshold at which enqueues start logging a warning.
pub const DEFAULT_WARN_PENDING_ACTIONS: usize = 800;

/// Default database connection pool size.
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;

/// Default remote request timeout in seconds.
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;
