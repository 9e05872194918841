//! Port interfaces for the scheduling core.
//!
//! Everything impure sits behind these traits: the calendar back end, the
//! persisted availability schedule, the account directory, and the
//! per-owner reflection lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openslot_domain::{
    Account, AvailableBlock, AvailableSchedule, CalendarEvent, OwnerId, Result, ScheduleOwner,
    ScheduleVisitor,
};
use uuid::Uuid;

/// Interface to the back-end calendar system.
///
/// The store is the final arbiter for conflicts: the scheduler's own
/// checks are optimistic, and a concurrent booking that slips past them
/// must surface as a typed error from the mutating call.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Fetch the account's calendar events between the given instants.
    async fn get_calendar(
        &self,
        account: &Account,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Look up the scheduling-assistant appointment matching the block in
    /// the owner's schedule, if one exists. Events not created by this
    /// system are never returned.
    async fn get_existing_appointment(
        &self,
        owner: &ScheduleOwner,
        block: &AvailableBlock,
    ) -> Result<Option<CalendarEvent>>;

    /// Create an appointment with the visitor as sole attendee.
    async fn create_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        block: &AvailableBlock,
        description: &str,
    ) -> Result<CalendarEvent>;

    /// Delete the appointment from the owner's schedule.
    async fn cancel_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        event: &CalendarEvent,
    ) -> Result<()>;

    /// Add the visitor as an attendee of an existing appointment.
    async fn join_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent>;

    /// Remove the visitor from the attendees of an existing appointment.
    async fn leave_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent>;

    /// Check the owner's schedule for events conflicting with the block.
    ///
    /// # Errors
    /// Returns [`openslot_domain::SchedulingError::ConflictExists`] when a
    /// conflicting event is present.
    async fn check_for_conflicts(&self, owner: &ScheduleOwner, block: &AvailableBlock)
        -> Result<()>;

    /// Replace the shadow copy of the owner's available schedule in their
    /// calendar with the given schedule. Replace semantics: reflecting the
    /// same schedule twice leaves identical persisted state.
    async fn reflect_available_schedule(
        &self,
        owner: &ScheduleOwner,
        schedule: &AvailableSchedule,
    ) -> Result<()>;

    /// Remove shadow entries between the given instants.
    async fn purge_available_schedule_reflections(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()>;
}

/// Access to an owner's persisted availability blocks.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// The owner's complete published schedule.
    async fn retrieve(&self, owner: &ScheduleOwner) -> Result<AvailableSchedule>;

    /// The published blocks whose start lies in `[start, end)`.
    async fn retrieve_range(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AvailableSchedule>;

    /// Resolve the preferred-minimum-duration slot beginning exactly at
    /// `start`, or `None` when the owner has no availability there.
    async fn resolve_target_block(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
    ) -> Result<Option<AvailableBlock>>;

    /// Resolve the double-length slot beginning at `start`: the two
    /// adjacent minimum-duration slots merged. `None` when either half is
    /// missing.
    async fn resolve_double_length_block(
        &self,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
    ) -> Result<Option<AvailableBlock>>;
}

/// Identity resolution. The core never compares raw directory attributes;
/// whether two accounts are the same person is this port's call alone.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// True when the two accounts refer to the same underlying person.
    async fn same_person(&self, a: &Account, b: &Account) -> Result<bool>;
}

/// Proof of holding an owner's reflection lock. Returned by
/// [`LockStore::try_acquire`] and consumed by [`LockStore::release`].
#[derive(Debug)]
pub struct Lease {
    /// The locked owner.
    pub owner_id: OwnerId,
    /// Token identifying this acquisition; release is a no-op for a stale
    /// token whose lease has already been reclaimed.
    pub token: Uuid,
    /// When the lock was taken.
    pub acquired_at: DateTime<Utc>,
}

/// Persisted per-owner mutual exclusion for schedule reflection.
///
/// One lock row per owner, created lazily on the first acquisition attempt
/// and reused afterwards. Implementations must persist the lock so that
/// multiple process instances exclude each other, and must bound the lease
/// lifetime so a crashed holder cannot wedge the owner.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Attempt to take the owner's lock. Returns `None` when another
    /// holder currently has an unexpired lease.
    async fn try_acquire(&self, owner_id: OwnerId) -> Result<Option<Lease>>;

    /// Release a previously acquired lease.
    async fn release(&self, lease: Lease) -> Result<()>;
}
