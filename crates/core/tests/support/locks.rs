use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use openslot_core::ports::{Lease, LockStore};
use openslot_domain::{OwnerId, Result as DomainResult, SchedulingError};
use uuid::Uuid;

/// In-memory fake for [`LockStore`]: one held token per owner.
#[derive(Default, Clone)]
pub struct MockLockStore {
    held: Arc<Mutex<HashMap<OwnerId, Uuid>>>,
    fail_release: Arc<AtomicBool>,
}

impl MockLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the owner's lock is currently held.
    pub fn is_held(&self, owner_id: OwnerId) -> bool {
        self.held.lock().unwrap().contains_key(&owner_id)
    }

    /// Take the owner's lock out of band, simulating another process.
    pub fn seize(&self, owner_id: OwnerId) {
        self.held.lock().unwrap().insert(owner_id, Uuid::new_v4());
    }

    /// Make every release fail.
    pub fn fail_releases(&self) {
        self.fail_release.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LockStore for MockLockStore {
    async fn try_acquire(&self, owner_id: OwnerId) -> DomainResult<Option<Lease>> {
        let mut held = self.held.lock().unwrap();
        if held.contains_key(&owner_id) {
            return Ok(None);
        }
        let token = Uuid::new_v4();
        held.insert(owner_id, token);
        Ok(Some(Lease { owner_id, token, acquired_at: Utc::now() }))
    }

    async fn release(&self, lease: Lease) -> DomainResult<()> {
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(SchedulingError::Backend("lock release failed".into()));
        }
        let mut held = self.held.lock().unwrap();
        if held.get(&lease.owner_id) == Some(&lease.token) {
            held.remove(&lease.owner_id);
        }
        Ok(())
    }
}
