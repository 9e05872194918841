//! Block of bookable availability.
//!
//! [`AvailableBlock`]s are immutable values: any capacity change produces a
//! new block. Identity and ordering are defined by `(start, end)` only, so a
//! block with an updated attendee count still compares equal to the
//! persisted slot it came from. That property is what lets the scheduler and
//! the visible-schedule map look up "the same slot" before and after an
//! attendance change.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SchedulingError};

/// A contiguous span of bookable time with a visitor capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableBlock {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    visitor_limit: u32,
    visitors_attending: u32,
}

impl AvailableBlock {
    /// Create a new block. Timestamps are truncated to the minute, matching
    /// the granularity of the persisted schedule.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] if `end <= start` or
    /// `visitor_limit < 1`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, visitor_limit: u32) -> Result<Self> {
        let start = truncate_to_minute(start)?;
        let end = truncate_to_minute(end)?;
        if end <= start {
            return Err(SchedulingError::InvalidInput(format!(
                "start ({start}) must precede end ({end})"
            )));
        }
        if visitor_limit < 1 {
            return Err(SchedulingError::InvalidInput(format!(
                "visitor_limit must be greater than or equal to 1: {visitor_limit}"
            )));
        }
        Ok(Self { start, end, visitor_limit, visitors_attending: 0 })
    }

    /// Start of the block (inclusive).
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the block (exclusive).
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Maximum number of visitors that may attend.
    pub fn visitor_limit(&self) -> u32 {
        self.visitor_limit
    }

    /// Number of visitors currently attending (not always populated).
    pub fn visitors_attending(&self) -> u32 {
        self.visitors_attending
    }

    /// Duration of the block in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Return a copy with one more visitor attending.
    ///
    /// # Errors
    /// Returns [`SchedulingError::CapacityExceeded`] when the block is full;
    /// the original value is left untouched.
    pub fn with_attendee(&self) -> Result<Self> {
        if self.visitors_attending >= self.visitor_limit {
            return Err(SchedulingError::CapacityExceeded);
        }
        let mut block = self.clone();
        block.visitors_attending += 1;
        Ok(block)
    }

    /// Return a copy with one fewer visitor attending.
    ///
    /// # Errors
    /// Returns [`SchedulingError::AttendeeUnderflow`] when no visitors are
    /// attending.
    pub fn without_attendee(&self) -> Result<Self> {
        if self.visitors_attending == 0 {
            return Err(SchedulingError::AttendeeUnderflow);
        }
        let mut block = self.clone();
        block.visitors_attending -= 1;
        Ok(block)
    }

    /// Return a copy with the attendee count set to `count`.
    ///
    /// Used when reconstructing a block from a persisted appointment, where
    /// the current count is already known.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] if `count` exceeds the
    /// visitor limit.
    pub fn with_attendee_count(&self, count: u32) -> Result<Self> {
        if count > self.visitor_limit {
            return Err(SchedulingError::InvalidInput(format!(
                "attendee count {count} exceeds visitor limit {}",
                self.visitor_limit
            )));
        }
        let mut block = self.clone();
        block.visitors_attending = count;
        Ok(block)
    }

    /// True when `other` begins exactly where this block ends.
    pub fn is_adjacent_to(&self, other: &Self) -> bool {
        self.end == other.start
    }

    /// True when the two blocks share any time.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when the block shares any time with `[start, end)`.
    pub fn overlaps_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }

    /// Merge this block with an exactly adjacent one of equal capacity,
    /// producing a single block spanning both. Used to build a
    /// double-length block from two single blocks.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] if the blocks are not
    /// exactly adjacent or their visitor limits differ.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        if !self.is_adjacent_to(other) {
            return Err(SchedulingError::InvalidInput(format!(
                "blocks are not adjacent: {self} / {other}"
            )));
        }
        if self.visitor_limit != other.visitor_limit {
            return Err(SchedulingError::InvalidInput(format!(
                "visitor limits differ: {} / {}",
                self.visitor_limit, other.visitor_limit
            )));
        }
        Self::new(self.start, other.end, self.visitor_limit)
    }

    /// Split this block into consecutive slots of `minutes` length,
    /// preserving the visitor limit. A trailing remainder shorter than
    /// `minutes` is dropped. A block already at the target length is
    /// returned as a single slot.
    pub fn expand(&self, minutes: i64) -> Vec<Self> {
        if minutes <= 0 || self.duration_minutes() <= minutes {
            return vec![self.clone()];
        }
        let step = Duration::minutes(minutes);
        let mut slots = Vec::new();
        let mut cursor = self.start;
        while cursor + step <= self.end {
            slots.push(Self {
                start: cursor,
                end: cursor + step,
                visitor_limit: self.visitor_limit,
                visitors_attending: 0,
            });
            cursor += step;
        }
        slots
    }

    /// Combine sorted blocks, merging each run of exactly adjacent blocks
    /// with equal visitor limits into a single larger block. The inverse of
    /// [`AvailableBlock::expand`]; used when reflecting the schedule into
    /// the owner's calendar.
    pub fn combine(blocks: &[Self]) -> Vec<Self> {
        let mut combined: Vec<Self> = Vec::new();
        for block in blocks {
            match combined.last_mut() {
                Some(last)
                    if last.is_adjacent_to(block) && last.visitor_limit == block.visitor_limit =>
                {
                    last.end = block.end;
                }
                _ => combined.push(block.clone()),
            }
        }
        combined
    }
}

fn truncate_to_minute(instant: DateTime<Utc>) -> Result<DateTime<Utc>> {
    instant
        .duration_trunc(Duration::minutes(1))
        .map_err(|e| SchedulingError::InvalidInput(format!("timestamp out of range: {e}")))
}

impl fmt::Display for AvailableBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AvailableBlock[start={}, end={}, visitorLimit={}, visitorsAttending={}]",
            self.start, self.end, self.visitor_limit, self.visitors_attending
        )
    }
}

// Identity is (start, end) only: capacity and attendance are immaterial.
impl PartialEq for AvailableBlock {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl Eq for AvailableBlock {}

impl Hash for AvailableBlock {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl Ord for AvailableBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start).then(self.end.cmp(&other.end))
    }
}

impl PartialOrd for AvailableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn instant(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, min, 0).unwrap()
    }

    fn block(start_min: (u32, u32), end_min: (u32, u32), limit: u32) -> AvailableBlock {
        AvailableBlock::new(instant(start_min.0, start_min.1), instant(end_min.0, end_min.1), limit)
            .unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let err = AvailableBlock::new(instant(14, 0), instant(13, 30), 1).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_visitor_limit() {
        let err = AvailableBlock::new(instant(13, 30), instant(14, 0), 0).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidInput(_)));
    }

    #[test]
    fn truncates_to_minute_granularity() {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 13, 30, 45).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 12).unwrap();
        let block = AvailableBlock::new(start, end, 1).unwrap();
        assert_eq!(block.start(), instant(13, 30));
        assert_eq!(block.end(), instant(14, 0));
    }

    #[test]
    fn capacity_bounds_hold_without_mutation() {
        let base = block((13, 30), (14, 0), 2);
        let one = base.with_attendee().unwrap();
        let two = one.with_attendee().unwrap();
        assert_eq!(two.visitors_attending(), 2);
        // full block refuses another attendee and stays unchanged
        assert_eq!(two.with_attendee().unwrap_err(), SchedulingError::CapacityExceeded);
        assert_eq!(two.visitors_attending(), 2);
        // empty block refuses removal
        assert_eq!(base.without_attendee().unwrap_err(), SchedulingError::AttendeeUnderflow);
        assert_eq!(base.visitors_attending(), 0);
    }

    #[test]
    fn attendee_round_trip_restores_count() {
        let base = block((13, 30), (14, 0), 3).with_attendee_count(1).unwrap();
        let joined = base.with_attendee().unwrap();
        let left = joined.without_attendee().unwrap();
        assert_eq!(left.visitors_attending(), base.visitors_attending());
    }

    #[test]
    fn equality_ignores_capacity() {
        let a = block((13, 30), (14, 0), 1);
        let b = block((13, 30), (14, 0), 10).with_attendee_count(4).unwrap();
        assert_eq!(a, b);

        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert(a.clone(), "before");
        map.insert(b, "after");
        assert_eq!(map.len(), 1);
        assert_eq!(map[&a], "after");
    }

    #[test]
    fn merge_requires_exact_adjacency_and_equal_limits() {
        let first = block((13, 30), (14, 0), 2);
        let second = block((14, 0), (14, 30), 2);
        let merged = first.merge(&second).unwrap();
        assert_eq!(merged.start(), instant(13, 30));
        assert_eq!(merged.end(), instant(14, 30));
        assert_eq!(merged.visitor_limit(), 2);

        let gap = block((15, 0), (15, 30), 2);
        assert!(first.merge(&gap).is_err());

        let different_limit = block((14, 0), (14, 30), 3);
        assert!(first.merge(&different_limit).is_err());
    }

    #[test]
    fn expand_splits_into_minimum_duration_slots() {
        let long = block((9, 0), (11, 0), 2);
        let slots = long.expand(30);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].start(), instant(9, 0));
        assert_eq!(slots[3].end(), instant(11, 0));
        assert!(slots.iter().all(|s| s.visitor_limit() == 2));
    }

    #[test]
    fn expand_drops_short_remainder() {
        let odd = block((9, 0), (9, 50), 1);
        let slots = odd.expand(30);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end(), instant(9, 30));
    }

    #[test]
    fn combine_is_inverse_of_expand() {
        let long = block((9, 0), (11, 0), 2);
        let combined = AvailableBlock::combine(&long.expand(30));
        assert_eq!(combined, vec![long]);
    }

    #[test]
    fn combine_respects_limit_boundaries() {
        let a = block((9, 0), (9, 30), 1);
        let b = block((9, 30), (10, 0), 2);
        let combined = AvailableBlock::combine(&[a.clone(), b.clone()]);
        assert_eq!(combined, vec![a, b]);
    }
}
