//! Cron-driven background scheduling.

pub mod error;
pub mod reflection_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use reflection_scheduler::{ReflectionJob, ReflectionScheduler, ReflectionSchedulerConfig};
