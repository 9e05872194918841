//! # OpenSlot Domain
//!
//! Business domain types and models for OpenSlot.
//!
//! This crate contains:
//! - Availability/appointment value types (`AvailableBlock`, schedules)
//! - Domain error types and Result definitions
//! - Owner preference and configuration structures
//!
//! ## Architecture
//! - No dependencies on other OpenSlot crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod account;
pub mod block;
pub mod config;
pub mod errors;
pub mod event;
pub mod preferences;
pub mod schedule;
pub mod window;

// Re-export commonly used items
pub use account::{Account, AccountId, OwnerId, ScheduleOwner, ScheduleVisitor};
pub use block::AvailableBlock;
pub use config::{DatabaseConfig, OpenSlotConfig, ReflectionConfig};
pub use errors::{Result, SchedulingError};
pub use event::CalendarEvent;
pub use preferences::{MeetingDurations, PreferenceKey, Preferences};
pub use schedule::{AvailableSchedule, AvailableStatus, VisibleSchedule};
pub use window::{VisibleWindow, WeekPage};
