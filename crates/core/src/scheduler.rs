//! The appointment scheduling state machine.
//!
//! Orchestrates create/join/leave/cancel of appointments against an
//! owner's published blocks: capacity and duplicate-person rules are
//! enforced here, conflict decisions are delegated to the calendar store,
//! and every requested range is clamped to the owner's visible window.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use openslot_domain::{
    AvailableBlock, CalendarEvent, Result, ScheduleOwner, ScheduleVisitor, SchedulingError,
    VisibleSchedule,
};
use tracing::{debug, instrument, warn};

use crate::conflicts::ConflictChecker;
use crate::events::{AppointmentChange, ChangeListener, TracingChangeListener};
use crate::ports::{AccountDirectory, AvailabilityStore, CalendarStore};
use crate::visible::VisibleScheduleBuilder;

/// Result of a schedule request.
#[derive(Debug, Clone)]
pub enum ScheduleOutcome {
    /// A new appointment was created with the visitor as sole attendee.
    Scheduled(CalendarEvent),
    /// The visitor was added to (or already attended) an existing
    /// appointment on the block.
    Joined(CalendarEvent),
    /// Owner and visitor are the same person; nothing was done. An owner
    /// may see their own slot rendered as bookable, so this is a defined
    /// success, not an error.
    SamePersonNoOp,
}

/// Result of a cancel request.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    /// The appointment was deleted entirely.
    Cancelled,
    /// The visitor left; the appointment persists for the remaining
    /// attendees.
    Left(CalendarEvent),
    /// Owner and visitor are the same person; nothing was done.
    SamePersonNoOp,
}

/// Main scheduling service: exposes the visible schedule and the
/// appointment state transitions.
pub struct SchedulingService {
    calendar: Arc<dyn CalendarStore>,
    availability: Arc<dyn AvailabilityStore>,
    directory: Arc<dyn AccountDirectory>,
    listener: Arc<dyn ChangeListener>,
    conflicts: ConflictChecker,
}

impl SchedulingService {
    /// Create a service with the default (tracing) change listener.
    pub fn new(
        calendar: Arc<dyn CalendarStore>,
        availability: Arc<dyn AvailabilityStore>,
        directory: Arc<dyn AccountDirectory>,
    ) -> Self {
        let conflicts = ConflictChecker::new(calendar.clone());
        Self {
            calendar,
            availability,
            directory,
            listener: Arc::new(TracingChangeListener),
            conflicts,
        }
    }

    /// Replace the change listener.
    pub fn with_listener(mut self, listener: Arc<dyn ChangeListener>) -> Self {
        self.listener = listener;
        self
    }

    /// The owner's classified schedule over their full visible window.
    pub async fn get_visible_schedule(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
    ) -> Result<VisibleSchedule> {
        let (start, end) = owner.preferred_visible_window().bounds(Utc::now());
        self.get_visible_schedule_between(visitor, owner, start, end).await
    }

    /// The owner's classified schedule over a requested range, clamped to
    /// the owner's visible window.
    #[instrument(skip(self, visitor, owner), fields(owner = %owner.id))]
    pub async fn get_visible_schedule_between(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<VisibleSchedule> {
        let window = owner.preferred_visible_window();
        let (start, end) = window.clamp(Utc::now(), start, end);
        if start == end {
            debug!("visible.window_empty_after_clamp");
            return Ok(VisibleSchedule::new(owner.preferred_meeting_durations()));
        }

        let events = self.calendar.get_calendar(&owner.account, start, end).await?;
        let availability = self.availability.retrieve_range(owner, start, end).await?;
        VisibleScheduleBuilder::calculate_visible_schedule(
            start,
            end,
            &events,
            &availability,
            owner,
            Some(visitor),
        )
    }

    /// The scheduling-assistant appointment on the block, if one exists.
    pub async fn get_existing_appointment(
        &self,
        block: &AvailableBlock,
        owner: &ScheduleOwner,
    ) -> Result<Option<CalendarEvent>> {
        self.calendar.get_existing_appointment(owner, block).await
    }

    /// The appointment on the block, only when the visitor attends it.
    pub async fn get_existing_appointment_for_visitor(
        &self,
        block: &AvailableBlock,
        owner: &ScheduleOwner,
        visitor: &ScheduleVisitor,
    ) -> Result<Option<CalendarEvent>> {
        let event = self.get_existing_appointment(block, owner).await?;
        Ok(event.filter(|e| e.is_attending_visitor(&visitor.account.id)))
    }

    /// Blocks of the owner's availability the visitor cannot attend
    /// because of their own calendar, within the owner's visible window.
    pub async fn calculate_visitor_conflicts(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AvailableBlock>> {
        let window = owner.preferred_visible_window();
        let (start, end) = window.clamp(Utc::now(), start, end);
        if start == end {
            return Ok(Vec::new());
        }
        let availability = self.availability.retrieve_range(owner, start, end).await?;
        self.conflicts
            .calculate_visitor_conflicts(visitor, owner, &availability, start, end)
            .await
    }

    /// Schedule an appointment for the visitor in the owner's block.
    ///
    /// Resolves the authoritative block from the owner's persisted
    /// availability, then creates a new appointment or joins an existing
    /// one. Capacity and conflict checks run strictly before any mutation
    /// is sent to the calendar store; the store may still reject a
    /// concurrent race, and that typed error propagates unchanged.
    ///
    /// # Errors
    /// - [`SchedulingError::SlotNotAvailable`] when no published block
    ///   matches the requested start
    /// - [`SchedulingError::CapacityExceeded`] when the existing
    ///   appointment is full
    /// - [`SchedulingError::ConflictExists`] when the owner has competing
    ///   calendar activity
    /// - backend failures from the calendar store, unchanged
    #[instrument(skip(self, visitor, owner, block, description), fields(owner = %owner.id, block_start = %block.start()))]
    pub async fn schedule_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        block: &AvailableBlock,
        description: &str,
    ) -> Result<ScheduleOutcome> {
        if self.directory.same_person(&owner.account, &visitor.account).await? {
            warn!("schedule.same_person_noop");
            return Ok(ScheduleOutcome::SamePersonNoOp);
        }

        let target = self.resolve_block(owner, block).await?;

        // the system's own appointment on the block is never a calendar
        // conflict: a live appointment is joined, or refused on capacity
        match self.calendar.get_existing_appointment(owner, &target).await? {
            None => {
                let event = self.create_checked(visitor, owner, &target, description).await?;
                Ok(ScheduleOutcome::Scheduled(event))
            }
            Some(existing) => {
                if existing.is_attending_visitor(&visitor.account.id) {
                    // already attending: booking again is an idempotent join
                    debug!(event_uid = %existing.uid, "schedule.already_attending");
                    return Ok(ScheduleOutcome::Joined(existing));
                }
                if existing.visitor_count() >= target.visitor_limit() as usize {
                    return Err(SchedulingError::CapacityExceeded);
                }
                // join checks capacity only; the slot was already committed
                // when the first visitor booked it
                let event = self.calendar.join_appointment(visitor, owner, &existing).await?;
                self.listener
                    .publish(AppointmentChange::Joined {
                        event: event.clone(),
                        owner: owner.id,
                        visitor: visitor.account.id.clone(),
                        block: target,
                    })
                    .await;
                Ok(ScheduleOutcome::Joined(event))
            }
        }
    }

    /// Cancel the visitor's attendance on the block's appointment.
    ///
    /// With other attendees present the visitor merely leaves; as the sole
    /// attendee the appointment is deleted.
    ///
    /// # Errors
    /// Returns [`SchedulingError::NoAppointmentExists`] when no live
    /// appointment matches the block, or the visitor does not attend it.
    #[instrument(skip(self, visitor, owner, event, block, reason), fields(owner = %owner.id, block_start = %block.start()))]
    pub async fn cancel_appointment(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        event: &CalendarEvent,
        block: &AvailableBlock,
        reason: Option<&str>,
    ) -> Result<CancelOutcome> {
        if self.directory.same_person(&owner.account, &visitor.account).await? {
            warn!("cancel.same_person_noop");
            return Ok(CancelOutcome::SamePersonNoOp);
        }

        // re-fetch the authoritative appointment rather than trusting the
        // caller-supplied event
        let Some(existing) = self.calendar.get_existing_appointment(owner, block).await? else {
            return Err(SchedulingError::NoAppointmentExists);
        };
        if !existing.is_attending_visitor(&visitor.account.id) {
            return Err(SchedulingError::NoAppointmentExists);
        }
        if existing.uid != event.uid {
            debug!(supplied = %event.uid, found = %existing.uid, "cancel.event_uid_mismatch");
        }

        if existing.visitor_count() <= 1 {
            // the requester is the last attendee: delete the event
            self.calendar.cancel_appointment(visitor, owner, &existing).await?;
            self.listener
                .publish(AppointmentChange::Cancelled {
                    event: existing,
                    owner: owner.id,
                    visitor: visitor.account.id.clone(),
                    block: block.clone(),
                    reason: reason.map(str::to_owned),
                })
                .await;
            Ok(CancelOutcome::Cancelled)
        } else {
            let remaining = self.calendar.leave_appointment(visitor, owner, &existing).await?;
            self.listener
                .publish(AppointmentChange::Left {
                    event: remaining.clone(),
                    owner: owner.id,
                    visitor: visitor.account.id.clone(),
                    block: block.clone(),
                })
                .await;
            Ok(CancelOutcome::Left(remaining))
        }
    }

    /// Resolve the authoritative block for the requested start time.
    ///
    /// The persisted schedule stores minimum-duration slots. When the
    /// caller requested the owner's double length against a single-visitor
    /// slot, the double-length block (two adjacent slots merged) is
    /// resolved instead.
    async fn resolve_block(
        &self,
        owner: &ScheduleOwner,
        requested: &AvailableBlock,
    ) -> Result<AvailableBlock> {
        let durations = owner.preferred_meeting_durations();
        let target = self.availability.resolve_target_block(owner, requested.start()).await?;

        let wants_double = durations.is_double_length()
            && requested.duration_minutes() == i64::from(durations.max_minutes());
        if wants_double {
            if let Some(single) = &target {
                if single.visitor_limit() == 1 {
                    let double = self
                        .availability
                        .resolve_double_length_block(owner, requested.start())
                        .await?;
                    return double.ok_or(SchedulingError::SlotNotAvailable);
                }
            }
        }

        target.ok_or(SchedulingError::SlotNotAvailable)
    }

    /// Conflict-check then create, publishing the change on success.
    async fn create_checked(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        target: &AvailableBlock,
        description: &str,
    ) -> Result<CalendarEvent> {
        self.conflicts.check_owner_conflict(owner, target).await?;
        let event = self.calendar.create_appointment(visitor, owner, target, description).await?;
        self.listener
            .publish(AppointmentChange::Created {
                event: event.clone(),
                owner: owner.id,
                visitor: visitor.account.id.clone(),
                block: target.clone(),
            })
            .await;
        Ok(event)
    }
}
