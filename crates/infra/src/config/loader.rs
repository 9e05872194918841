//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `OPENSLOT_DB_PATH`: Database file path
//! - `OPENSLOT_DB_POOL_SIZE`: Connection pool size
//! - `OPENSLOT_REFLECTION_ENABLED`: Whether the reflection sweep runs (true/false)
//! - `OPENSLOT_REFLECTION_CRON`: Cron expression for the reflection sweep
//! - `OPENSLOT_REFLECTION_JOB_TIMEOUT`: Per-run timeout in seconds
//! - `OPENSLOT_REFLECTION_LEASE_TTL`: Reflection lock lease lifetime in seconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./openslot.json` or `./openslot.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use openslot_domain::{
    DatabaseConfig, OpenSlotConfig, ReflectionConfig, Result, SchedulingError,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns [`SchedulingError::InvalidInput`] if configuration cannot be
/// loaded from either source, the file format is invalid, or required
/// fields are missing.
pub fn load() -> Result<OpenSlotConfig> {
    // pick up a local .env before reading the environment
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The database variables are required; the reflection variables fall back
/// to their defaults when unset.
///
/// # Errors
/// Returns [`SchedulingError::InvalidInput`] if required variables are
/// missing or have invalid values.
pub fn load_from_env() -> Result<OpenSlotConfig> {
    let db_path = env_var("OPENSLOT_DB_PATH")?;
    let db_pool_size = env_var("OPENSLOT_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>()
            .map_err(|e| SchedulingError::InvalidInput(format!("invalid pool size: {e}")))
    })?;

    let defaults = ReflectionConfig::default();
    let reflection_enabled = env_bool("OPENSLOT_REFLECTION_ENABLED", defaults.enabled);
    let cron_expression =
        std::env::var("OPENSLOT_REFLECTION_CRON").unwrap_or(defaults.cron_expression);
    let job_timeout_seconds =
        env_u64("OPENSLOT_REFLECTION_JOB_TIMEOUT", defaults.job_timeout_seconds)?;
    let lease_ttl_seconds =
        env_u64("OPENSLOT_REFLECTION_LEASE_TTL", defaults.lease_ttl_seconds)?;

    Ok(OpenSlotConfig {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        reflection: ReflectionConfig {
            enabled: reflection_enabled,
            cron_expression,
            job_timeout_seconds,
            lease_ttl_seconds,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns [`SchedulingError::InvalidInput`] if the file is missing, no
/// config file can be found, or the contents fail to parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<OpenSlotConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SchedulingError::InvalidInput(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SchedulingError::InvalidInput(
                "no config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        SchedulingError::InvalidInput(format!("failed to read config file: {e}"))
    })?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, with the format detected by
/// file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<OpenSlotConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SchedulingError::InvalidInput(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SchedulingError::InvalidInput(format!("invalid JSON format: {e}"))),
        _ => Err(SchedulingError::InvalidInput(format!(
            "unsupported config format: {extension}"
        ))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, up to two parent levels, and
/// the executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("openslot.json"),
            cwd.join("openslot.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("openslot.json"),
                exe_dir.join("openslot.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SchedulingError::InvalidInput(format!("missing required environment variable: {key}"))
    })
}

/// Parse an optional u64 environment variable, keeping `default` when the
/// variable is unset.
fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| SchedulingError::InvalidInput(format!("invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
