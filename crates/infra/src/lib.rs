//! # OpenSlot Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite persistence for availability schedules and reflection locks
//! - Configuration loading from environment variables or files
//! - The cron-driven reflection scheduler
//!
//! ## Architecture
//! - Implements traits defined in `openslot-core`
//! - Depends on `openslot-domain` and `openslot-core`
//! - Contains all "impure" code (I/O, database, timers)

pub mod config;
pub mod database;
pub mod errors;
pub mod scheduling;

// Re-export commonly used items
pub use database::availability_repository::SqliteAvailabilityStore;
pub use database::manager::DbManager;
pub use database::reflect_lock_repository::SqliteLockStore;
pub use errors::InfraError;
