//! Errors for the reflection scheduler lifecycle.

use openslot_domain::SchedulingError as DomainError;
use thiserror::Error;

use crate::errors::InfraError;

/// Failures of the cron-driven reflection scheduler.
///
/// Lifecycle transitions (create, start, stop, join) share the two
/// stage-tagged variants; the running-state misuses keep their own
/// variants because callers match on them.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Start was requested while the scheduler is running.
    #[error("reflection scheduler is already running")]
    AlreadyRunning,

    /// Stop was requested while the scheduler is not running.
    #[error("reflection scheduler is not running")]
    NotRunning,

    /// A lifecycle transition failed inside the underlying scheduler.
    #[error("reflection scheduler {stage} failed: {message}")]
    Lifecycle {
        /// The transition that failed.
        stage: &'static str,
        /// The underlying failure.
        message: String,
    },

    /// A lifecycle transition did not complete within its timeout.
    #[error("reflection scheduler {stage} timed out after {seconds}s")]
    Timeout {
        /// The transition that timed out.
        stage: &'static str,
        /// The timeout that elapsed.
        seconds: u64,
    },
}

impl SchedulerError {
    pub(crate) fn lifecycle(stage: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Lifecycle { stage, message: source.to_string() }
    }
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let domain_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                DomainError::InvalidInput(err.to_string())
            }
            SchedulerError::Lifecycle { .. } | SchedulerError::Timeout { .. } => {
                DomainError::Backend(err.to_string())
            }
        };
        InfraError(domain_err)
    }
}

impl From<SchedulerError> for DomainError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_misuse_maps_to_invalid_input() {
        let InfraError(domain) = SchedulerError::AlreadyRunning.into();
        assert!(matches!(domain, DomainError::InvalidInput(_)));
    }

    #[test]
    fn lifecycle_failures_map_to_backend() {
        let InfraError(domain) = SchedulerError::lifecycle("start", "cron parse error").into();
        match domain {
            DomainError::Backend(msg) => assert!(msg.contains("start")),
            other => panic!("expected a backend error, got {other:?}"),
        }

        let InfraError(domain) = SchedulerError::Timeout { stage: "stop", seconds: 5 }.into();
        assert!(matches!(domain, DomainError::Backend(_)));
    }
}
