//! Connection pool management for the local SQLite database.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::errors::InfraError;

/// One pooled connection.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS schedules (
        owner_id       INTEGER NOT NULL,
        start_ts       INTEGER NOT NULL,
        end_ts         INTEGER NOT NULL,
        visitor_limit  INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (owner_id, start_ts, end_ts)
    );
    CREATE INDEX IF NOT EXISTS idx_schedules_owner_start
        ON schedules (owner_id, start_ts);

    CREATE TABLE IF NOT EXISTS reflect_locks (
        owner_id    INTEGER PRIMARY KEY,
        token       TEXT,
        held_since  INTEGER
    );
";

/// Shared connection pool over the application database.
///
/// Connections run in WAL mode with a busy timeout so blocking repository
/// calls from multiple tasks do not immediately fail on contention.
pub struct DbManager {
    pool: Pool<SqliteConnectionManager>,
}

impl DbManager {
    /// Open (or create) the database at `path` with a pool of `pool_size`
    /// connections.
    pub fn new(path: impl AsRef<Path>, pool_size: u32) -> Result<Self, InfraError> {
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )
        });
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        info!(path = %path.as_ref().display(), pool_size, "database.pool_ready");
        Ok(Self { pool })
    }

    /// Check out a connection from the pool.
    pub fn get_connection(&self) -> Result<DbConnection, InfraError> {
        Ok(self.pool.get()?)
    }

    /// Create the schema if it does not exist yet. Idempotent.
    pub fn run_migrations(&self) -> Result<(), InfraError> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!("database.migrations_applied");
        Ok(())
    }
}
