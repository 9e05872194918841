//! Owner preference storage and the typed values parsed out of it.
//!
//! Preferences persist as an opaque key→string map. The core consults only
//! a handful of keys: preferred meeting durations, visible window, meeting
//! limit, default visitor limit, and the reflect-schedule flag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SchedulingError};
use crate::window::VisibleWindow;

/// Allowed meeting lengths: a single duration, or a single plus an optional
/// double length (two adjacent single blocks merged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDurations {
    min_minutes: u32,
    max_minutes: u32,
}

impl MeetingDurations {
    /// 15 minute meetings only.
    pub const FIFTEEN: Self = Self { min_minutes: 15, max_minutes: 15 };
    /// 30 minute meetings only.
    pub const THIRTY: Self = Self { min_minutes: 30, max_minutes: 30 };
    /// 45 minute meetings only.
    pub const FORTY_FIVE: Self = Self { min_minutes: 45, max_minutes: 45 };
    /// 30 minute meetings with an optional 60 minute double.
    pub const THIRTY_SIXTY: Self = Self { min_minutes: 30, max_minutes: 60 };

    /// Parse the stored key format: `"30"` or `"30,60"`.
    ///
    /// # Errors
    /// Returns [`SchedulingError::InvalidInput`] when the key is not one or
    /// two comma-separated integers.
    pub fn from_key(key: &str) -> Result<Self> {
        let mut tokens = key.split(',');
        let min = parse_token(key, tokens.next())?;
        let max = match tokens.next() {
            Some(token) => parse_token(key, Some(token))?,
            None => min,
        };
        if tokens.next().is_some() {
            return Err(SchedulingError::InvalidInput(format!(
                "durations key must contain at most two values: {key}"
            )));
        }
        if min == 0 || max < min {
            return Err(SchedulingError::InvalidInput(format!("invalid durations key: {key}")));
        }
        Ok(Self { min_minutes: min, max_minutes: max })
    }

    /// The stored key representation.
    pub fn key(&self) -> String {
        if self.min_minutes == self.max_minutes {
            self.min_minutes.to_string()
        } else {
            format!("{},{}", self.min_minutes, self.max_minutes)
        }
    }

    /// The single (minimum) meeting length in minutes.
    pub fn min_minutes(&self) -> u32 {
        self.min_minutes
    }

    /// The maximum meeting length in minutes.
    pub fn max_minutes(&self) -> u32 {
        self.max_minutes
    }

    /// True when the maximum is exactly twice the single length.
    pub fn is_double_length(&self) -> bool {
        self.max_minutes == 2 * self.min_minutes
    }
}

impl Default for MeetingDurations {
    fn default() -> Self {
        Self::THIRTY
    }
}

fn parse_token(key: &str, token: Option<&str>) -> Result<u32> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| {
            SchedulingError::InvalidInput(format!("durations values must be integers: {key}"))
        })
}

/// The preference keys the scheduling core consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PreferenceKey {
    /// Preferred meeting durations ([`MeetingDurations`] key format).
    MeetingDurations,
    /// Visible window ([`VisibleWindow`] key format).
    VisibleWindow,
    /// Maximum number of appointments a visitor may hold with this owner
    /// (`-1` for unlimited).
    MeetingLimit,
    /// Visitor limit applied to newly created blocks.
    DefaultVisitorLimit,
    /// Whether to mirror the available schedule into the owner's calendar.
    ReflectSchedule,
}

impl PreferenceKey {
    /// Storage name for this key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MeetingDurations => "durations",
            Self::VisibleWindow => "visibleWindow",
            Self::MeetingLimit => "meetingLimit",
            Self::DefaultVisitorLimit => "defaultVisitorLimit",
            Self::ReflectSchedule => "reflectSchedule",
        }
    }
}

/// An owner's stored preference map with typed accessors.
///
/// Accessors fall back to documented defaults when a key is absent or its
/// stored value does not parse; typed setters keep stored values valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    values: BTreeMap<String, String>,
}

impl Preferences {
    /// Raw value for a key, if present.
    pub fn get(&self, key: PreferenceKey) -> Option<&str> {
        self.values.get(key.as_str()).map(String::as_str)
    }

    /// Store a raw value for a key.
    pub fn set(&mut self, key: PreferenceKey, value: impl Into<String>) {
        self.values.insert(key.as_str().to_owned(), value.into());
    }

    /// Preferred meeting durations; defaults to 30 minutes.
    pub fn meeting_durations(&self) -> MeetingDurations {
        self.get(PreferenceKey::MeetingDurations)
            .and_then(|v| MeetingDurations::from_key(v).ok())
            .unwrap_or_default()
    }

    /// Store preferred meeting durations.
    pub fn set_meeting_durations(&mut self, durations: MeetingDurations) {
        self.set(PreferenceKey::MeetingDurations, durations.key());
    }

    /// Preferred visible window; defaults to 24 hours / 3 weeks.
    pub fn visible_window(&self) -> VisibleWindow {
        self.get(PreferenceKey::VisibleWindow)
            .and_then(|v| VisibleWindow::from_key(v).ok())
            .unwrap_or_default()
    }

    /// Store the preferred visible window.
    pub fn set_visible_window(&mut self, window: VisibleWindow) {
        self.set(PreferenceKey::VisibleWindow, window.key());
    }

    /// Per-visitor meeting limit; `-1` (the default) means unlimited.
    pub fn meeting_limit(&self) -> i32 {
        self.get(PreferenceKey::MeetingLimit).and_then(|v| v.parse().ok()).unwrap_or(-1)
    }

    /// Visitor limit for newly created blocks; defaults to 1.
    pub fn default_visitor_limit(&self) -> u32 {
        self.get(PreferenceKey::DefaultVisitorLimit)
            .and_then(|v| v.parse().ok())
            .filter(|v| *v >= 1)
            .unwrap_or(1)
    }

    /// Whether schedule reflection is enabled; defaults to false.
    pub fn reflect_schedule(&self) -> bool {
        self.get(PreferenceKey::ReflectSchedule).map(|v| v == "true").unwrap_or(false)
    }

    /// Enable or disable schedule reflection.
    pub fn set_reflect_schedule(&mut self, enabled: bool) {
        self.set(PreferenceKey::ReflectSchedule, if enabled { "true" } else { "false" });
    }
}
