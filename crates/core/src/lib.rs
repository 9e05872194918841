//! # OpenSlot Core
//!
//! Pure scheduling logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the calendar back end,
//!   availability storage, directory, and reflection locks
//! - The appointment scheduling state machine
//! - Visible-schedule classification and conflict calculation
//! - The lock-guarded schedule-reflection coordinator
//!
//! ## Architecture Principles
//! - Only depends on `openslot-domain`
//! - No database, HTTP, or calendar-protocol code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod conflicts;
pub mod events;
pub mod ports;
pub mod reflection;
pub mod scheduler;
pub mod visible;

// Re-export specific items to avoid ambiguity
pub use conflicts::ConflictChecker;
pub use events::{AppointmentChange, ChangeListener, TracingChangeListener};
pub use ports::{AccountDirectory, AvailabilityStore, CalendarStore, Lease, LockStore};
pub use reflection::ReflectionCoordinator;
pub use scheduler::{CancelOutcome, ScheduleOutcome, SchedulingService};
pub use visible::VisibleScheduleBuilder;
