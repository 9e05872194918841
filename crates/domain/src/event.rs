//! Calendar event representation at the port boundary.
//!
//! The calendar back end is opaque to the core; this type carries only the
//! fields the scheduling logic inspects: the time range, who attends, and
//! the markers distinguishing assistant-created appointments and schedule
//! reflections from ordinary calendar entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// An event fetched from, or persisted to, the calendar store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Back-end unique identifier.
    pub uid: String,
    /// Event summary/title.
    pub summary: String,
    /// Event description, when present.
    pub description: Option<String>,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant (exclusive).
    pub end: DateTime<Utc>,
    /// The owning account, when the event belongs to a schedule owner.
    pub owner: Option<AccountId>,
    /// Visitors attending the event.
    pub visitor_attendees: Vec<AccountId>,
    /// True for appointments created by this system.
    pub assistant_appointment: bool,
    /// Visitor limit recorded on assistant appointments.
    pub visitor_limit: Option<u32>,
    /// True for shadow entries written by schedule reflection.
    pub availability_reflection: bool,
    /// True when the event does not block the account's time.
    pub transparent: bool,
}

impl CalendarEvent {
    /// Number of visitors attending.
    pub fn visitor_count(&self) -> usize {
        self.visitor_attendees.len()
    }

    /// True when `account` attends this event as a visitor.
    pub fn is_attending_visitor(&self, account: &AccountId) -> bool {
        self.visitor_attendees.contains(account)
    }

    /// True when `account` owns this event.
    pub fn is_attending_owner(&self, account: &AccountId) -> bool {
        self.owner.as_ref() == Some(account)
    }

    /// True when the event consumes `account`'s time: reflections and
    /// transparent events never conflict, and neither do events the
    /// account does not participate in.
    pub fn causes_conflict(&self, account: &AccountId) -> bool {
        if self.transparent || self.availability_reflection {
            return false;
        }
        self.is_attending_owner(account) || self.is_attending_visitor(account)
    }

    /// True when the event shares any time with `[start, end)`.
    pub fn overlaps_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn event(owner: Option<&str>, visitors: &[&str]) -> CalendarEvent {
        CalendarEvent {
            uid: "abc-123".into(),
            summary: "Advising".into(),
            description: None,
            start: Utc.with_ymd_and_hms(2024, 6, 3, 13, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap(),
            owner: owner.map(AccountId::from),
            visitor_attendees: visitors.iter().copied().map(AccountId::from).collect(),
            assistant_appointment: false,
            visitor_limit: None,
            availability_reflection: false,
            transparent: false,
        }
    }

    #[test]
    fn conflict_requires_participation() {
        let ev = event(Some("owner"), &["v1"]);
        assert!(ev.causes_conflict(&AccountId::from("owner")));
        assert!(ev.causes_conflict(&AccountId::from("v1")));
        assert!(!ev.causes_conflict(&AccountId::from("stranger")));
    }

    #[test]
    fn reflections_and_transparent_events_never_conflict() {
        let mut reflection = event(Some("owner"), &[]);
        reflection.availability_reflection = true;
        reflection.transparent = true;
        assert!(!reflection.causes_conflict(&AccountId::from("owner")));

        let mut transparent = event(Some("owner"), &[]);
        transparent.transparent = true;
        assert!(!transparent.causes_conflict(&AccountId::from("owner")));
    }

    #[test]
    fn range_overlap_is_half_open() {
        let ev = event(Some("owner"), &[]);
        let touches_end = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
        assert!(!ev.overlaps_range(touches_end, touches_end + chrono::Duration::minutes(30)));
        let inside = Utc.with_ymd_and_hms(2024, 6, 3, 13, 45, 0).unwrap();
        assert!(ev.overlaps_range(inside, inside + chrono::Duration::minutes(30)));
    }
}
