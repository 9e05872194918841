//! Visible window policy.
//!
//! An owner's visible window bounds how far from "now" a visitor may see
//! and book: no earlier than `hours_from_now` hours out, no later than
//! `weeks_ahead` weeks out. Requested ranges are clamped to the window
//! rather than rejected.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SchedulingError};

/// Bounds on the date range a visitor is allowed to see and book within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleWindow {
    hours_from_now: u32,
    weeks_ahead: u32,
}

/// A single 7-day page of a visible window, with pagination hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekPage {
    /// Start of the page (inclusive).
    pub start: DateTime<Utc>,
    /// End of the page (exclusive), clamped to the window end.
    pub end: DateTime<Utc>,
    /// Offset of the following page, when one exists inside the window.
    pub next_offset: Option<u32>,
    /// Offset of the preceding page, when this is not the first.
    pub prev_offset: Option<u32>,
}

impl VisibleWindow {
    /// Create a window.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] unless
    /// `1 <= hours_from_now < 168` and `1 <= weeks_ahead <= 26`.
    pub fn new(hours_from_now: u32, weeks_ahead: u32) -> Result<Self> {
        if !(1..168).contains(&hours_from_now) {
            return Err(SchedulingError::InvalidInput(format!(
                "hours_from_now must be in [1, 168): {hours_from_now}"
            )));
        }
        if !(1..=26).contains(&weeks_ahead) {
            return Err(SchedulingError::InvalidInput(format!(
                "weeks_ahead must be in [1, 26]: {weeks_ahead}"
            )));
        }
        Ok(Self { hours_from_now, weeks_ahead })
    }

    /// Parse the stored key format `"hours,weeks"`, e.g. `"24,3"`.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] when the key is not two
    /// comma-separated integers within range.
    pub fn from_key(key: &str) -> Result<Self> {
        let tokens: Vec<&str> = key.split(',').collect();
        if tokens.len() != 2 {
            return Err(SchedulingError::InvalidInput(format!(
                "window key must be formatted as 'hours,weeks': {key}"
            )));
        }
        let hours = tokens[0].trim().parse().map_err(|_| {
            SchedulingError::InvalidInput(format!("window values must be integers: {key}"))
        })?;
        let weeks = tokens[1].trim().parse().map_err(|_| {
            SchedulingError::InvalidInput(format!("window values must be integers: {key}"))
        })?;
        Self::new(hours, weeks)
    }

    /// The stored key representation.
    pub fn key(&self) -> String {
        format!("{},{}", self.hours_from_now, self.weeks_ahead)
    }

    /// Hours from now before which nothing is bookable.
    pub fn hours_from_now(&self) -> u32 {
        self.hours_from_now
    }

    /// Weeks from now beyond which nothing is bookable.
    pub fn weeks_ahead(&self) -> u32 {
        self.weeks_ahead
    }

    /// Earliest visible instant relative to `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::hours(i64::from(self.hours_from_now))
    }

    /// Latest visible instant relative to `now`.
    pub fn window_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::weeks(i64::from(self.weeks_ahead))
    }

    /// Both bounds relative to `now`.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.window_start(now), self.window_end(now))
    }

    /// Clamp a requested range to the window. An inverted result collapses
    /// to an empty range (`start == end`) instead of failing.
    pub fn clamp(
        &self,
        now: DateTime<Utc>,
        requested_start: DateTime<Utc>,
        requested_end: DateTime<Utc>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let (window_start, window_end) = self.bounds(now);
        let start = requested_start.max(window_start);
        let end = requested_end.min(window_end);
        if end <= start {
            (start, start)
        } else {
            (start, end)
        }
    }

    /// Compute the Nth 7-day page of the window (`week_offset >= 1`),
    /// clamped to the window end.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] when `week_offset` is 0.
    pub fn week_page(&self, now: DateTime<Utc>, week_offset: u32) -> Result<WeekPage> {
        if week_offset == 0 {
            return Err(SchedulingError::InvalidInput(
                "week_offset must be greater than or equal to 1".into(),
            ));
        }
        let (window_start, window_end) = self.bounds(now);
        let raw_start = window_start + Duration::weeks(i64::from(week_offset) - 1);
        let start = raw_start.min(window_end);
        let end = (raw_start + Duration::weeks(1)).min(window_end);
        let next_offset = (end < window_end).then_some(week_offset + 1);
        let prev_offset = (week_offset > 1).then_some(week_offset - 1);
        Ok(WeekPage { start, end, next_offset, prev_offset })
    }
}

/// Defaults to 24 hours from now, 3 weeks ahead.
impl Default for VisibleWindow {
    fn default() -> Self {
        Self { hours_from_now: 24, weeks_ahead: 3 }
    }
}
