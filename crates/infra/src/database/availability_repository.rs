//! SQLite-backed implementation of the `AvailabilityStore` port.
//!
//! Owners publish availability as rows of `(start, end, visitor_limit)`.
//! Rows may be stored at any granularity; retrieval consolidates adjacent
//! equal-capacity rows and target resolution works on the owner's
//! preferred minimum-duration slots. All queries go through the shared
//! [`DbManager`] pool on blocking tasks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use openslot_core::ports::AvailabilityStore;
use openslot_domain::{
    AvailableBlock, AvailableSchedule, Result as DomainResult, ScheduleOwner, SchedulingError,
};
use rusqlite::{params, Connection, ToSql};
use tokio::task;
use tracing::debug;

use super::manager::DbManager;
use crate::errors::InfraError;

/// SQLite-backed availability repository.
pub struct SqliteAvailabilityStore {
    db: Arc<DbManager>,
}

const BLOCK_SELECT_FOR_OWNER: &str = "SELECT start_ts, end_ts, visitor_limit
    FROM schedules
    WHERE owner_id = ?1
    ORDER BY start_ts ASC";

const BLOCK_SELECT_STARTING_IN_RANGE: &str = "SELECT start_ts, end_ts, visitor_limit
    FROM schedules
    WHERE owner_id = ?1 AND start_ts >= ?2 AND start_ts < ?3
    ORDER BY start_ts ASC";

const BLOCK_SELECT_OVERLAPPING_RANGE: &str = "SELECT start_ts, end_ts, visitor_limit
    FROM schedules
    WHERE owner_id = ?1 AND end_ts > ?2 AND start_ts < ?3
    ORDER BY start_ts ASC";

impl SqliteAvailabilityStore {
    /// Create a repository backed by the shared pool.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Publish blocks into the owner's schedule. Re-publishing an existing
    /// `(start, end)` row overwrites its visitor limit.
    pub async fn add_blocks(
        &self,
        owner: &ScheduleOwner,
        blocks: Vec<AvailableBlock>,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let owner_id = owner.id.0;

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection().map_err(SchedulingError::from)?;
            let tx = conn.transaction().map_err(backend)?;
            for block in &blocks {
                tx.execute(
                    "INSERT OR REPLACE INTO schedules (owner_id, start_ts, end_ts, visitor_limit)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        owner_id,
                        block.start().timestamp(),
                        block.end().timestamp(),
                        block.visitor_limit()
                    ],
                )
                .map_err(backend)?;
            }
            tx.commit().map_err(backend)?;
            debug!(owner = owner_id, count = blocks.len(), "schedule.blocks_added");
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    /// Remove the exact `(start, end)` rows from the owner's schedule.
    pub async fn remove_blocks(
        &self,
        owner: &ScheduleOwner,
        blocks: Vec<AvailableBlock>,
    ) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let owner_id = owner.id.0;

        task::spawn_blocking(move || -> DomainResult<usize> {
            let mut conn = db.get_connection().map_err(SchedulingError::from)?;
            let tx = conn.transaction().map_err(backend)?;
            let mut removed = 0;
            for block in &blocks {
                removed += tx
                    .execute(
                        "DELETE FROM schedules
                         WHERE owner_id = ?1 AND start_ts = ?2 AND end_ts = ?3",
                        params![owner_id, block.start().timestamp(), block.end().timestamp()],
                    )
                    .map_err(backend)?;
            }
            tx.commit().map_err(backend)?;
            Ok(removed)
        })
        .await
        .map_err(join_err)?
    }

    /// Delete the owner's entire published schedule.
    pub async fn clear_schedule(&self, owner: &ScheduleOwner) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let owner_id = owner.id.0;

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection().map_err(SchedulingError::from)?;
            conn.execute("DELETE FROM schedules WHERE owner_id = ?1", params![owner_id])
                .map_err(backend)
        })
        .await
        .map_err(join_err)?
    }

    /// Delete blocks (for every owner) that ended at or before `cutoff`.
    /// Returns the number of rows removed.
    pub async fn purge_expired_blocks(&self, cutoff: DateTime<Utc>) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let cutoff_ts = cutoff.timestamp();

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection().map_err(SchedulingError::from)?;
            let removed = conn
                .execute("DELETE FROM schedules WHERE end_ts <= ?1", params![cutoff_ts])
                .map_err(backend)?;
            debug!(removed, "schedule.expired_blocks_purged");
            Ok(removed)
        })
        .await
        .map_err(join_err)?
    }

    async fn query_schedule(
        &self,
        sql: &'static str,
        owner: &ScheduleOwner,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> DomainResult<AvailableSchedule> {
        let db = Arc::clone(&self.db);
        let owner_id = owner.id.0;

        task::spawn_blocking(move || -> DomainResult<AvailableSchedule> {
            let conn = db.get_connection().map_err(SchedulingError::from)?;
            let blocks = match range {
                Some((start, end)) => {
                    let start_ts = start.timestamp();
                    let end_ts = end.timestamp();
                    let params: [&dyn ToSql; 3] = [&owner_id, &start_ts, &end_ts];
                    query_blocks(&conn, sql, &params)?
                }
                None => {
                    let params: [&dyn ToSql; 1] = [&owner_id];
                    query_blocks(&conn, sql, &params)?
                }
            };
            Ok(AvailableSchedule::new(blocks))
        })
        .await
        .map_err(join_err)?
    }
}

#[async_trait]
impl AvailabilityStore for SqliteAvailabilityStore {
    async fn retrieve(&self, owner: &ScheduleOwner) -> DomainResult<AvailableSchedule> {
        self.query_schedule(BLOCK_SELECT_FOR_OWNER, owner, None).await
    }

    async fn retrieve_range(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<AvailableSchedule> {
        self.query_schedule(BLOCK_SELECT_STARTING_IN_RANGE, owner, Some((start, end))).await
    }

    async fn resolve_target_block(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
    ) -> DomainResult<Option<AvailableBlock>> {
        let minutes = i64::from(owner.preferred_meeting_durations().min_minutes());
        let covering = self
            .query_schedule(
                BLOCK_SELECT_OVERLAPPING_RANGE,
                owner,
                Some((start, start + Duration::minutes(minutes))),
            )
            .await?;
        Ok(covering.consolidated().expand(minutes).into_iter().find(|b| b.start() == start))
    }

    async fn resolve_double_length_block(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
    ) -> DomainResult<Option<AvailableBlock>> {
        let minutes = i64::from(owner.preferred_meeting_durations().min_minutes());
        // pull everything overlapping both halves so adjacent stored rows
        // can be merged before slot expansion
        let covering = self
            .query_schedule(
                BLOCK_SELECT_OVERLAPPING_RANGE,
                owner,
                Some((start, start + Duration::minutes(2 * minutes))),
            )
            .await?;
        let slots = covering.consolidated().expand(minutes);
        let Some(first) = slots.iter().find(|b| b.start() == start) else {
            return Ok(None);
        };
        let Some(second) = slots.iter().find(|b| b.start() == first.end()) else {
            return Ok(None);
        };
        Ok(first.merge(second).ok())
    }
}

fn query_blocks(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> DomainResult<Vec<AvailableBlock>> {
    let mut stmt = conn.prepare(sql).map_err(backend)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, u32>(2)?))
        })
        .map_err(backend)?;

    let mut blocks = Vec::new();
    for row in rows {
        let (start_ts, end_ts, limit) = row.map_err(backend)?;
        let start = timestamp(start_ts)?;
        let end = timestamp(end_ts)?;
        blocks.push(AvailableBlock::new(start, end, limit)?);
    }
    Ok(blocks)
}

fn timestamp(ts: i64) -> DomainResult<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| SchedulingError::Backend(format!("timestamp out of range: {ts}")))
}

fn backend(err: rusqlite::Error) -> SchedulingError {
    InfraError::from(err).into()
}

fn join_err(err: task::JoinError) -> SchedulingError {
    InfraError::from(err).into()
}
