//! SQLite-backed implementation of the `LockStore` port.
//!
//! One `reflect_locks` row per owner acts as a persisted semaphore for
//! schedule reflection. The row is created lazily on the first acquisition
//! attempt and reused forever after; acquisition is a single conditional
//! `UPDATE`, so two processes sharing the database cannot both win.
//!
//! A held lease older than the configured TTL is treated as abandoned (a
//! crashed holder) and may be taken over by the next acquirer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use openslot_core::ports::{Lease, LockStore};
use openslot_domain::{OwnerId, Result as DomainResult, SchedulingError};
use rusqlite::params;
use tokio::task;
use tracing::{debug, warn};
use uuid::Uuid;

use super::manager::DbManager;
use crate::errors::InfraError;

/// SQLite-backed reflection lock store.
pub struct SqliteLockStore {
    db: Arc<DbManager>,
    lease_ttl: Duration,
}

impl SqliteLockStore {
    /// Create a lock store whose leases expire after `lease_ttl_seconds`.
    pub fn new(db: Arc<DbManager>, lease_ttl_seconds: u64) -> Self {
        Self { db, lease_ttl: Duration::seconds(lease_ttl_seconds as i64) }
    }
}

#[async_trait]
impl LockStore for SqliteLockStore {
    async fn try_acquire(&self, owner_id: OwnerId) -> DomainResult<Option<Lease>> {
        let db = Arc::clone(&self.db);
        let ttl = self.lease_ttl;

        task::spawn_blocking(move || -> DomainResult<Option<Lease>> {
            let conn = db.get_connection().map_err(SchedulingError::from)?;
            let now = Utc::now();
            let token = Uuid::new_v4();

            // ensure the owner's lock row exists; losing this race to
            // another process is fine, the row is all we need
            conn.execute(
                "INSERT OR IGNORE INTO reflect_locks (owner_id, token, held_since)
                 VALUES (?1, NULL, NULL)",
                params![owner_id.0],
            )
            .map_err(backend)?;

            // free rows and expired leases are both up for grabs
            let stale_cutoff = (now - ttl).timestamp();
            let updated = conn
                .execute(
                    "UPDATE reflect_locks
                     SET token = ?2, held_since = ?3
                     WHERE owner_id = ?1
                       AND (token IS NULL OR held_since < ?4)",
                    params![owner_id.0, token.to_string(), now.timestamp(), stale_cutoff],
                )
                .map_err(backend)?;

            if updated == 1 {
                debug!(owner = owner_id.0, %token, "reflect_lock.acquired");
                Ok(Some(Lease { owner_id, token, acquired_at: now }))
            } else {
                debug!(owner = owner_id.0, "reflect_lock.held_elsewhere");
                Ok(None)
            }
        })
        .await
        .map_err(join_err)?
    }

    async fn release(&self, lease: Lease) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection().map_err(SchedulingError::from)?;
            let released = conn
                .execute(
                    "UPDATE reflect_locks
                     SET token = NULL, held_since = NULL
                     WHERE owner_id = ?1 AND token = ?2",
                    params![lease.owner_id.0, lease.token.to_string()],
                )
                .map_err(backend)?;

            // a reclaimed lease releases nothing; the takeover already
            // invalidated this token
            if released == 0 {
                warn!(owner = lease.owner_id.0, token = %lease.token, "reflect_lock.release_stale_token");
            } else {
                debug!(owner = lease.owner_id.0, "reflect_lock.released");
            }
            Ok(())
        })
        .await
        .map_err(join_err)?
    }
}

fn backend(err: rusqlite::Error) -> SchedulingError {
    InfraError::from(err).into()
}

fn join_err(err: task::JoinError) -> SchedulingError {
    InfraError::from(err).into()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn setup(ttl_seconds: u64) -> (SqliteLockStore, Arc<DbManager>, TempDir) {
        let dir = TempDir::new().expect("temp dir created");
        let manager =
            Arc::new(DbManager::new(dir.path().join("locks.db"), 4).expect("pool created"));
        manager.run_migrations().expect("migrations run");
        (SqliteLockStore::new(manager.clone(), ttl_seconds), manager, dir)
    }

    fn held_since(manager: &Arc<DbManager>, owner: i64, ts: i64) {
        let conn = manager.get_connection().expect("connection");
        conn.execute(
            "UPDATE reflect_locks SET held_since = ?2 WHERE owner_id = ?1",
            params![owner, ts],
        )
        .expect("backdated");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_acquisition_is_refused_while_held() {
        let (store, _manager, _dir) = setup(300).await;

        let lease = store.try_acquire(OwnerId(1)).await.unwrap().expect("first acquire wins");
        assert!(store.try_acquire(OwnerId(1)).await.unwrap().is_none());

        // an unrelated owner is unaffected
        assert!(store.try_acquire(OwnerId(2)).await.unwrap().is_some());

        store.release(lease).await.unwrap();
        assert!(store.try_acquire(OwnerId(1)).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expired_lease_is_taken_over() {
        let (store, manager, _dir) = setup(300).await;

        let old_lease = store.try_acquire(OwnerId(1)).await.unwrap().expect("acquired");
        // backdate the lease beyond the TTL, simulating a crashed holder
        held_since(&manager, 1, (Utc::now() - Duration::seconds(600)).timestamp());

        let new_lease =
            store.try_acquire(OwnerId(1)).await.unwrap().expect("stale lease reclaimed");
        assert_ne!(new_lease.token, old_lease.token);

        // the dead holder's release is a no-op, the new lease stays live
        store.release(old_lease).await.unwrap();
        assert!(store.try_acquire(OwnerId(1)).await.unwrap().is_none());

        store.release(new_lease).await.unwrap();
        assert!(store.try_acquire(OwnerId(1)).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fresh_lease_is_not_reclaimed() {
        let (store, _manager, _dir) = setup(300).await;
        let _lease = store.try_acquire(OwnerId(1)).await.unwrap().expect("acquired");
        assert!(store.try_acquire(OwnerId(1)).await.unwrap().is_none());
    }
}
