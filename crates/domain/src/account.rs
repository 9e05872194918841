//! Account and schedule-role types.
//!
//! Accounts are flat records exposing only the fields the scheduling core
//! actually needs. Whether two accounts are the same person is decided by
//! the directory port, never by comparing raw attributes here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::preferences::{MeetingDurations, Preferences};
use crate::window::VisibleWindow;

/// Opaque, directory-issued account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Internal identifier for a registered schedule owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub i64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A calendar-capable person known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Directory-issued unique identifier.
    pub id: AccountId,
    /// Login name.
    pub username: String,
    /// Human-readable name.
    pub display_name: String,
    /// Primary email address.
    pub email: String,
    /// Whether this account may participate in scheduling.
    pub eligible: bool,
}

/// A person who has registered and publishes bookable time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOwner {
    /// Internal owner identifier (lock rows, persisted schedules).
    pub id: OwnerId,
    /// The owner's directory account.
    pub account: Account,
    /// The owner's stored preferences.
    pub preferences: Preferences,
}

impl ScheduleOwner {
    /// The owner's preferred meeting durations, falling back to the default.
    pub fn preferred_meeting_durations(&self) -> MeetingDurations {
        self.preferences.meeting_durations()
    }

    /// The owner's preferred visible window, falling back to the default.
    pub fn preferred_visible_window(&self) -> VisibleWindow {
        self.preferences.visible_window()
    }

    /// Whether the owner wants their availability mirrored into their
    /// primary calendar.
    pub fn reflect_schedule_enabled(&self) -> bool {
        self.preferences.reflect_schedule()
    }
}

/// A person booking (attending) an appointment in an owner's block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleVisitor {
    /// The visitor's directory account.
    pub account: Account,
}
