//! Lock-guarded reflection of availability into the owner's calendar.
//!
//! Reflection writes a shadow copy of the owner's published blocks into
//! their calendar so colleagues see the open slots as ordinary events. The
//! write is replace-style and guarded by a persisted per-owner lock so
//! that concurrent triggers (periodic job plus an on-demand request, or
//! two process instances) never interleave their writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use openslot_domain::{Result, ScheduleOwner, SchedulingError};
use tracing::{debug, info, instrument, warn};

use crate::ports::{AvailabilityStore, CalendarStore, LockStore};

/// Coordinates schedule reflection under the per-owner lock.
pub struct ReflectionCoordinator {
    calendar: Arc<dyn CalendarStore>,
    availability: Arc<dyn AvailabilityStore>,
    locks: Arc<dyn LockStore>,
}

impl ReflectionCoordinator {
    /// Create a coordinator over the given stores.
    pub fn new(
        calendar: Arc<dyn CalendarStore>,
        availability: Arc<dyn AvailabilityStore>,
        locks: Arc<dyn LockStore>,
    ) -> Self {
        Self { calendar, availability, locks }
    }

    /// Reflect the owner's current availability into their calendar.
    ///
    /// A no-op success when the owner has reflection disabled. The
    /// persisted schedule is consolidated (adjacent equal-capacity blocks
    /// merged) before writing, so repeated runs against an unchanged
    /// schedule leave identical calendar state.
    ///
    /// # Errors
    /// Returns [`SchedulingError::LockContention`] immediately when
    /// another holder has the owner's lock; the caller decides whether to
    /// retry later.
    #[instrument(skip(self, owner), fields(owner = %owner.id))]
    pub async fn reflect(&self, owner: &ScheduleOwner) -> Result<()> {
        if !owner.reflect_schedule_enabled() {
            debug!("reflection.disabled_for_owner");
            return Ok(());
        }

        let Some(lease) = self.locks.try_acquire(owner.id).await? else {
            info!("reflection.lock_contended");
            return Err(SchedulingError::LockContention);
        };
        debug!(token = %lease.token, "reflection.lock_acquired");

        // run under the lease, then release on every path; a release
        // failure is logged but never masks the reflection outcome
        let outcome = self.reflect_locked(owner).await;
        if let Err(release_err) = self.locks.release(lease).await {
            warn!(error = %release_err, "reflection.lock_release_failed");
        }
        outcome
    }

    /// Remove reflected entries between the given instants.
    ///
    /// Purging deletes shadow events only and takes no lock: it cannot
    /// corrupt a concurrent reflection, which rewrites the full window
    /// anyway.
    #[instrument(skip(self, owner), fields(owner = %owner.id))]
    pub async fn purge(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()> {
        self.calendar.purge_available_schedule_reflections(owner, start, end).await
    }

    async fn reflect_locked(&self, owner: &ScheduleOwner) -> Result<()> {
        let schedule = self.availability.retrieve(owner).await?;
        let consolidated = schedule.consolidated();
        self.calendar.reflect_available_schedule(owner, &consolidated).await?;
        info!(blocks = consolidated.len(), "reflection.completed");
        Ok(())
    }
}
