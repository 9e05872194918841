//! Cron-based scheduler for the periodic reflection sweep.
//!
//! Triggers a user-supplied job at fixed intervals. Join handles are
//! tracked, cancellation is explicit, and every asynchronous operation is
//! wrapped in a timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use openslot_infra::scheduling::{
//!     ReflectionJob, ReflectionScheduler, ReflectionSchedulerConfig, SchedulerResult,
//! };
//!
//! struct NoopJob;
//!
//! #[async_trait]
//! impl ReflectionJob for NoopJob {
//!     async fn run(&self) -> Result<(), openslot_infra::errors::InfraError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> SchedulerResult<()> {
//! let job = Arc::new(NoopJob);
//! let mut scheduler = ReflectionScheduler::with_config(
//!     ReflectionSchedulerConfig {
//!         cron_expression: "0 */5 * * * *".into(), // every 5 minutes
//!         ..Default::default()
//!     },
//!     job,
//! )
//! .await?;
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use openslot_domain::ReflectionConfig;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::InfraError;
use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Trait representing one reflection sweep.
#[async_trait]
pub trait ReflectionJob: Send + Sync {
    /// Execute the sweep.
    async fn run(&self) -> Result<(), InfraError>;
}

/// Configuration for the reflection scheduler.
#[derive(Debug, Clone)]
pub struct ReflectionSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single sweep.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for ReflectionSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 */5 * * * *".into(), // every 5 minutes
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&ReflectionConfig> for ReflectionSchedulerConfig {
    fn from(config: &ReflectionConfig) -> Self {
        Self {
            cron_expression: config.cron_expression.clone(),
            job_timeout: Duration::from_secs(config.job_timeout_seconds),
            ..Self::default()
        }
    }
}

/// Reflection scheduler with explicit lifecycle management.
pub struct ReflectionScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    config: ReflectionSchedulerConfig,
    job_id: Uuid,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    job: Arc<dyn ReflectionJob>,
}

impl ReflectionScheduler {
    /// Create a scheduler with the default configuration and the given
    /// cron expression.
    pub async fn new(cron_expression: String, job: Arc<dyn ReflectionJob>) -> SchedulerResult<Self> {
        let config = ReflectionSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, job).await
    }

    /// Create a scheduler with a custom configuration.
    pub async fn with_config(
        config: ReflectionSchedulerConfig,
        job: Arc<dyn ReflectionJob>,
    ) -> SchedulerResult<Self> {
        let raw_scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::lifecycle("create", source))?;

        let mut scheduler = Self {
            scheduler: Arc::new(RwLock::new(raw_scheduler)),
            config,
            job_id: Uuid::nil(),
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            job,
        };

        scheduler.job_id = scheduler.register_reflection_job().await?;
        Ok(scheduler)
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler = self.scheduler.clone();
        let start_timeout = self.config.start_timeout;
        let start_result = tokio::time::timeout(start_timeout, async move {
            let guard = scheduler.write().await;
            guard.start().await
        })
        .await
        .map_err(|_| SchedulerError::Timeout { stage: "start", seconds: start_timeout.as_secs() })?;

        start_result.map_err(|source| SchedulerError::lifecycle("start", source))?;

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!("Reflection scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let scheduler = self.scheduler.clone();
        let stop_timeout = self.config.stop_timeout;
        let stop_result = tokio::time::timeout(stop_timeout, async move {
            let mut guard = scheduler.write().await;
            guard.shutdown().await
        })
        .await
        .map_err(|_| SchedulerError::Timeout { stage: "stop", seconds: stop_timeout.as_secs() })?;

        stop_result.map_err(|source| SchedulerError::lifecycle("stop", source))?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout {
                    stage: "join",
                    seconds: join_timeout.as_secs(),
                })?
                .map_err(|source| SchedulerError::lifecycle("join", source))?;
        }

        info!("Reflection scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when the monitor task is active.
    pub fn is_running(&self) -> bool {
        self.monitor_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    async fn register_reflection_job(&mut self) -> SchedulerResult<Uuid> {
        if self.job_id != Uuid::nil() {
            return Ok(self.job_id);
        }

        let cron_expr = self.config.cron_expression.clone();
        let job = self.job.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let job = job.clone();

            Box::pin(async move {
                debug!("Reflection sweep invoked");
                let started = Instant::now();

                match tokio::time::timeout(job_timeout, job.run()).await {
                    Ok(Ok(())) => {
                        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Reflection sweep finished");
                    }
                    Ok(Err(err)) => {
                        error!(error = ?err, "Reflection sweep failed");
                    }
                    Err(_) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "Reflection sweep timed out");
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::lifecycle("job registration", source))?;

        let job_id = job_definition.guid();
        let scheduler = self.scheduler.write().await;
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::lifecycle("job registration", source))?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered reflection sweep job");
        Ok(job_id)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Reflection scheduler monitor cancelled");
    }
}

impl Drop for ReflectionScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ReflectionScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingJob {
        runs: AtomicUsize,
    }

    impl CountingJob {
        fn new() -> Self {
            Self { runs: AtomicUsize::new(0) }
        }

        fn run_count(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReflectionJob for CountingJob {
        async fn run(&self) -> Result<(), InfraError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast_config() -> ReflectionSchedulerConfig {
        ReflectionSchedulerConfig {
            cron_expression: "*/1 * * * * *".into(), // every second
            job_timeout: Duration::from_secs(2),
            start_timeout: Duration::from_secs(2),
            stop_timeout: Duration::from_secs(2),
            join_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_runs_successfully() {
        let job = Arc::new(CountingJob::new());
        let mut scheduler = ReflectionScheduler::with_config(fast_config(), job.clone())
            .await
            .expect("scheduler created");

        scheduler.start().await.expect("start succeeds");
        tokio::time::sleep(Duration::from_secs(2)).await;
        scheduler.stop().await.expect("stop succeeds");

        assert!(job.run_count() >= 1);
        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_is_rejected() {
        let job = Arc::new(CountingJob::new());
        let mut scheduler =
            ReflectionScheduler::with_config(fast_config(), job).await.expect("scheduler created");

        scheduler.start().await.expect("first start");
        let err = scheduler.start().await.expect_err("second start fails");
        assert!(matches!(err, SchedulerError::AlreadyRunning));
        scheduler.stop().await.expect("stop succeeds");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restart_after_stop_succeeds() {
        let job = Arc::new(CountingJob::new());
        let mut scheduler =
            ReflectionScheduler::with_config(fast_config(), job).await.expect("scheduler created");

        scheduler.start().await.expect("start succeeds");
        scheduler.stop().await.expect("stop succeeds");
        assert!(!scheduler.is_running());

        scheduler.start().await.expect("start again");
        scheduler.stop().await.expect("stop again");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn config_derives_from_reflection_settings() {
        let reflection = ReflectionConfig {
            enabled: true,
            cron_expression: "0 */10 * * * *".into(),
            job_timeout_seconds: 60,
            lease_ttl_seconds: 300,
        };
        let config = ReflectionSchedulerConfig::from(&reflection);
        assert_eq!(config.cron_expression, "0 */10 * * * *");
        assert_eq!(config.job_timeout, Duration::from_secs(60));
    }
}
