//! Conflict checking for owners and visitors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use openslot_domain::{AvailableBlock, AvailableSchedule, Result, ScheduleOwner, ScheduleVisitor};
use tracing::instrument;

use crate::ports::CalendarStore;
use crate::visible::VisibleScheduleBuilder;

/// Compares candidate blocks against calendar data.
///
/// The owner check is the optimistic pre-flight before a create; the
/// calendar store remains the final arbiter under concurrency. The visitor
/// calculation is purely informational and never mutates anything.
pub struct ConflictChecker {
    calendar: Arc<dyn CalendarStore>,
}

impl ConflictChecker {
    /// Create a checker backed by the given calendar store.
    pub fn new(calendar: Arc<dyn CalendarStore>) -> Self {
        Self { calendar }
    }

    /// Verify the owner has no competing calendar event inside the block.
    ///
    /// # Errors
    /// Returns [`openslot_domain::SchedulingError::ConflictExists`] when a
    /// competing event overlaps `[block.start, block.end)`.
    pub async fn check_owner_conflict(
        &self,
        owner: &ScheduleOwner,
        block: &AvailableBlock,
    ) -> Result<()> {
        self.calendar.check_for_conflicts(owner, block).await
    }

    /// Find the blocks of the owner's availability that the visitor cannot
    /// actually attend because of their own calendar.
    ///
    /// Returns a possibly empty list; never mutates the schedule.
    #[instrument(skip(self, availability), fields(owner = %owner.id))]
    pub async fn calculate_visitor_conflicts(
        &self,
        visitor: &ScheduleVisitor,
        owner: &ScheduleOwner,
        availability: &AvailableSchedule,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AvailableBlock>> {
        // the owner's availability classified against the visitor's data
        let visitor_events = self.calendar.get_calendar(&visitor.account, start, end).await?;
        let classified = VisibleScheduleBuilder::calculate_conflicts(
            start,
            end,
            &visitor_events,
            availability,
            owner.preferred_meeting_durations(),
            &visitor.account,
        )?;
        Ok(classified.busy_list())
    }
}
