//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for OpenSlot.
///
/// Scheduling-rule violations are dedicated variants so callers can map
/// them to user-facing messaging; infrastructure failures surface as
/// [`SchedulingError::Backend`] and are never wrapped or retried by the
/// core.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SchedulingError {
    #[error("requested time is not available in the owner's schedule")]
    SlotNotAvailable,

    #[error("a conflicting event exists on the calendar")]
    ConflictExists,

    #[error("visitor limit for this appointment has been met")]
    CapacityExceeded,

    #[error("block has no attendees to remove")]
    AttendeeUnderflow,

    #[error("no matching appointment can be found")]
    NoAppointmentExists,

    #[error("a schedule reflection is already in progress for this owner")]
    LockContention,

    #[error("backend unavailable: {0}")]
    Backend(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for OpenSlot operations
pub type Result<T> = std::result::Result<T, SchedulingError>;
