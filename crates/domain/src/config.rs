//! Application configuration structures.
//!
//! Loaded by the infra layer from environment variables or a config file;
//! kept here so every crate shares the same shapes.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSlotConfig {
    /// Local database settings (schedules, lock rows).
    pub database: DatabaseConfig,
    /// Schedule reflection settings.
    pub reflection: ReflectionConfig,
}

/// Settings for the local SQLite database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub path: String,
    /// Connection pool size.
    pub pool_size: u32,
}

/// Settings for the background schedule-reflection job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionConfig {
    /// Whether the background reflection job runs at all.
    pub enabled: bool,
    /// Cron expression driving the reflection sweep.
    pub cron_expression: String,
    /// Per-run timeout in seconds.
    pub job_timeout_seconds: u64,
    /// Reflection lock lease lifetime in seconds. A lock row held longer
    /// than this is treated as abandoned and may be reclaimed.
    pub lease_ttl_seconds: u64,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: "0 */5 * * * *".into(),
            job_timeout_seconds: 300,
            lease_ttl_seconds: 300,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "openslot.db".into(), pool_size: 4 }
    }
}

impl Default for OpenSlotConfig {
    fn default() -> Self {
        Self { database: DatabaseConfig::default(), reflection: ReflectionConfig::default() }
    }
}
