//! SQLite persistence for schedules and reflection locks.

pub mod availability_repository;
pub mod manager;
pub mod reflect_lock_repository;

pub use availability_repository::SqliteAvailabilityStore;
pub use manager::DbManager;
pub use reflect_lock_repository::SqliteLockStore;
