//! Visible-schedule construction.
//!
//! Merges an owner's published availability with calendar data into a
//! classified [`VisibleSchedule`]: availability not covered by calendar
//! activity stays free, covered slots become busy, and the acting
//! visitor's own appointments show as attending.

use chrono::{DateTime, Utc};
use openslot_domain::{
    Account, AccountId, AvailableBlock, AvailableSchedule, CalendarEvent, MeetingDurations,
    Result, ScheduleOwner, ScheduleVisitor, SchedulingError, VisibleSchedule,
};
use tracing::debug;

/// Builds classified schedules out of availability and calendar events.
pub struct VisibleScheduleBuilder;

impl VisibleScheduleBuilder {
    /// Classify the owner's schedule for display to `visitor`.
    ///
    /// `events` must be the owner's calendar for `[start, end)`. When a
    /// visitor is supplied, appointments attended by both parties are
    /// marked attending; the attending status always wins over busy for
    /// that visitor.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] when `end` precedes
    /// `start`.
    pub fn calculate_visible_schedule(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        events: &[CalendarEvent],
        availability: &AvailableSchedule,
        owner: &ScheduleOwner,
        visitor: Option<&ScheduleVisitor>,
    ) -> Result<VisibleSchedule> {
        let attending_pair =
            visitor.map(|v| (owner.account.id.clone(), v.account.id.clone()));
        build(
            start,
            end,
            events,
            availability,
            owner.preferred_meeting_durations(),
            &owner.account.id,
            attending_pair.as_ref(),
        )
    }

    /// Classify the owner's availability against the *actor's own*
    /// calendar. Used for visitor-conflict calculation: the busy list of
    /// the result is the set of blocks the actor cannot attend. No
    /// attending check is performed.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] when `end` precedes
    /// `start`.
    pub fn calculate_conflicts(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        events: &[CalendarEvent],
        availability: &AvailableSchedule,
        durations: MeetingDurations,
        actor: &Account,
    ) -> Result<VisibleSchedule> {
        build(start, end, events, availability, durations, &actor.id, None)
    }
}

fn build(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    events: &[CalendarEvent],
    availability: &AvailableSchedule,
    durations: MeetingDurations,
    actor: &AccountId,
    attending_pair: Option<&(AccountId, AccountId)>,
) -> Result<VisibleSchedule> {
    if end < start {
        return Err(SchedulingError::InvalidInput(format!(
            "end ({end}) cannot precede start ({start})"
        )));
    }

    let mut visible = VisibleSchedule::new(durations);

    // expand availability to minimum-duration slots and trim to the range
    let slots = availability.expand(i64::from(durations.min_minutes()));
    visible.add_free_blocks(slots.iter().filter(|b| b.start() >= start && b.start() < end));

    for event in events {
        if !event.causes_conflict(actor) {
            debug!(event_uid = %event.uid, "visible.event_skipped_no_conflict");
            continue;
        }
        if !event.overlaps_range(start, end) {
            continue;
        }
        let Some(event_block) = event_block(event) else {
            debug!(event_uid = %event.uid, "visible.event_skipped_degenerate_range");
            continue;
        };

        if !event.assistant_appointment {
            // ordinary calendar activity is always simply busy
            visible.set_busy_block(&event_block);
            continue;
        }

        if let Some((owner_account, visitor_account)) = attending_pair {
            if event.is_attending_owner(owner_account)
                && event.is_attending_visitor(visitor_account)
            {
                visible.set_attending_block(&event_block);
                continue;
            }
        }

        if event.is_attending_owner(actor) {
            let limit = event.visitor_limit.unwrap_or(1) as usize;
            let count = event.visitor_count();
            if count >= limit {
                visible.set_busy_block(&event_block);
            } else if let Ok(current) = u32::try_from(count) {
                // below capacity: the slot stays free, carrying the
                // current attendee count
                if let Ok(updated) = event_block.with_attendee_count(current) {
                    visible.overwrite_free_block_if_present(&updated);
                }
            }
        } else {
            // an assistant appointment the actor merely appears in
            visible.set_busy_block(&event_block);
        }
    }

    Ok(visible)
}

/// Build the comparison block for an event; `None` for degenerate ranges.
fn event_block(event: &CalendarEvent) -> Option<AvailableBlock> {
    AvailableBlock::new(event.start, event.end, event.visitor_limit.unwrap_or(1)).ok()
}
