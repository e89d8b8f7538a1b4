//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required variables are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `FLEXLOG_DB_PATH`: Database file path (required)
//! - `FLEXLOG_REMOTE_BASE_URL`: Workout API base URL (required)
//! - `FLEXLOG_DB_POOL_SIZE`: Connection pool size
//! - `FLEXLOG_REMOTE_TIMEOUT_SECS`: Remote request timeout in seconds
//! - `FLEXLOG_REMOTE_API_TOKEN`: Bearer token for the workout API
//! - `FLEXLOG_QUEUE_MAX_PENDING`: Hard cap on queued actions
//! - `FLEXLOG_QUEUE_WARN_PENDING`: Soft warning threshold on queued actions
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `flexlog.{json,toml}` in the
//! working directory, its parents (up to 2 levels), and next to the
//! executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use flexlog_domain::{
    Config, DatabaseConfig, FlexLogError, QueueConfig, RemoteConfig, Result,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `FlexLogError::Config` if configuration cannot be loaded from
/// either source, or if the loaded values fail validation.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `FLEXLOG_DB_PATH` and `FLEXLOG_REMOTE_BASE_URL` are required; everything
/// else defaults.
///
/// # Errors
/// Returns `FlexLogError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("FLEXLOG_DB_PATH")?;
    let base_url = env_var("FLEXLOG_REMOTE_BASE_URL")?;

    let defaults = Config::default();
    let pool_size = env_parsed("FLEXLOG_DB_POOL_SIZE", defaults.database.pool_size)?;
    let timeout_seconds =
        env_parsed("FLEXLOG_REMOTE_TIMEOUT_SECS", defaults.remote.timeout_seconds)?;
    let api_token = std::env::var("FLEXLOG_REMOTE_API_TOKEN").ok();
    let max_pending =
        env_parsed("FLEXLOG_QUEUE_MAX_PENDING", defaults.queue.max_pending_actions)?;
    let warn_pending =
        env_parsed("FLEXLOG_QUEUE_WARN_PENDING", defaults.queue.warn_pending_actions)?;

    let config = Config {
        database: DatabaseConfig { path: db_path, pool_size },
        remote: RemoteConfig { base_url, timeout_seconds, api_token },
        queue: QueueConfig {
            max_pending_actions: max_pending,
            warn_pending_actions: warn_pending,
        },
    };
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files. Supports
/// both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FlexLogError::Config` if no file is found, the format is
/// invalid, or validation fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FlexLogError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FlexLogError::Config(
                "no config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FlexLogError::Config(format!("failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FlexLogError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FlexLogError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(FlexLogError::Config(format!("unsupported config format: {extension}"))),
    }
}

fn validate(config: &Config) -> Result<()> {
    config.queue.validate().map_err(FlexLogError::Config)?;
    if config.remote.base_url.is_empty() {
        return Err(FlexLogError::Config("remote.base_url must not be empty".into()));
    }
    Ok(())
}

/// Probe standard locations for a configuration file, returning the first
/// that exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for base in ["", "../", "../../"] {
            for name in ["config.json", "config.toml", "flexlog.json", "flexlog.toml"] {
                candidates.push(cwd.join(format!("{base}{name}")));
            }
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in ["config.json", "config.toml", "flexlog.json", "flexlog.toml"] {
                candidates.push(exe_dir.join(name));
            }
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FlexLogError::Config(format!("missing required environment variable: {key}"))
    })
}

fn env_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| FlexLogError::Config(format!("invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        "FLEXLOG_DB_PATH",
        "FLEXLOG_DB_POOL_SIZE",
        "FLEXLOG_REMOTE_BASE_URL",
        "FLEXLOG_REMOTE_TIMEOUT_SECS",
        "FLEXLOG_REMOTE_API_TOKEN",
        "FLEXLOG_QUEUE_MAX_PENDING",
        "FLEXLOG_QUEUE_WARN_PENDING",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn load_from_env_with_required_vars_uses_defaults_for_the_rest() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("FLEXLOG_DB_PATH", "/tmp/flexlog-test.db");
        std::env::set_var("FLEXLOG_REMOTE_BASE_URL", "https://api.example.test");

        let config = load_from_env().expect("config loads");
        assert_eq!(config.database.path, "/tmp/flexlog-test.db");
        assert_eq!(config.remote.base_url, "https://api.example.test");
        assert_eq!(config.database.pool_size, Config::default().database.pool_size);
        assert_eq!(
            config.queue.max_pending_actions,
            Config::default().queue.max_pending_actions
        );
        assert!(config.remote.api_token.is_none());

        clear_env();
    }

    #[test]
    fn load_from_env_rejects_missing_db_path() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let result = load_from_env();
        assert!(matches!(result, Err(FlexLogError::Config(_))));
    }

    #[test]
    fn load_from_env_rejects_invalid_pool_size() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("FLEXLOG_DB_PATH", "/tmp/flexlog-test.db");
        std::env::set_var("FLEXLOG_REMOTE_BASE_URL", "https://api.example.test");
        std::env::set_var("FLEXLOG_DB_POOL_SIZE", "not-a-number");

        let result = load_from_env();
        assert!(matches!(result, Err(FlexLogError::Config(_))));

        clear_env();
    }

    #[test]
    fn load_from_env_rejects_warn_above_cap() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("FLEXLOG_DB_PATH", "/tmp/flexlog-test.db");
        std::env::set_var("FLEXLOG_REMOTE_BASE_URL", "https://api.example.test");
        std::env::set_var("FLEXLOG_QUEUE_MAX_PENDING", "10");
        std::env::set_var("FLEXLOG_QUEUE_WARN_PENDING", "20");

        let result = load_from_env();
        assert!(matches!(result, Err(FlexLogError::Config(_))));

        clear_env();
    }

    #[test]
    fn load_from_file_toml() {
        let toml_content = r#"
[database]
path = "flexlog.db"
pool_size = 6

[remote]
base_url = "https://api.example.test"
timeout_seconds = 10

[queue]
max_pending_actions = 500
warn_pending_actions = 400
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("config loads");
        assert_eq!(config.database.pool_size, 6);
        assert_eq!(config.remote.timeout_seconds, 10);
        assert_eq!(config.queue.max_pending_actions, 500);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn load_from_file_json() {
        let json_content = r#"{
            "database": { "path": "flexlog.db", "pool_size": 2 },
            "remote": { "base_url": "https://api.example.test", "timeout_seconds": 15, "api_token": "tok" },
            "queue": { "max_pending_actions": 100, "warn_pending_actions": 80 }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("config loads");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.remote.api_token.as_deref(), Some("tok"));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn load_from_file_rejects_missing_file() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/flexlog.json")));
        assert!(matches!(result, Err(FlexLogError::Config(_))));
    }

    #[test]
    fn load_from_file_rejects_unsupported_format() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"database: {}").unwrap();
        let path = temp_file.path().with_extension("yaml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(matches!(result, Err(FlexLogError::Config(_))));

        std::fs::remove_file(path).ok();
    }
}
