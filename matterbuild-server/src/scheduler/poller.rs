//! Build poller
//!
//! Invokes a job and follows the one build that invocation created until it
//! finishes. The build is always polled by number, never as "last build", so
//! other triggers of the same job cannot be mistaken for ours.

use matterbuild_client::runner::JobRunner;
use matterbuild_core::domain::build::{BuildState, BuildStatus, InvocationHandle, JobParameters};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::config::PollingConfig;
use crate::error::AppError;
use crate::scheduler::ShutdownSignal;

/// Timings for following a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Polls allowed before a fresh build counts as unreachable
    pub reachability_attempts: u32,
    /// Backoff after failed attempt `n` is `n * backoff_unit`
    pub backoff_unit: Duration,
    /// Pause between finding the build and waiting for completion
    pub grace_period: Duration,
    pub poll_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            reachability_attempts: config.reachability_attempts,
            backoff_unit: config.backoff_unit(),
            grace_period: config.grace_period(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Follows builds on a job runner
#[derive(Clone)]
pub struct Poller {
    runner: Arc<dyn JobRunner>,
    policy: PollPolicy,
    shutdown: ShutdownSignal,
}

impl Poller {
    pub fn new(runner: Arc<dyn JobRunner>, policy: PollPolicy, shutdown: ShutdownSignal) -> Self {
        Self {
            runner,
            policy,
            shutdown,
        }
    }

    /// Start a build without waiting for it
    pub async fn trigger(&self, job: &str, parameters: &JobParameters) -> Result<InvocationHandle, AppError> {
        let handle = self
            .runner
            .invoke(job, parameters)
            .await
            .map_err(|source| AppError::InvokeFailed {
                job: job.to_string(),
                source,
            })?;

        info!(job = %job, build_number = handle.build_number, "Triggered job");
        Ok(handle)
    }

    /// Start a build and wait until it reaches a terminal status
    ///
    /// The wait is unbounded once the build has been found; only shutdown
    /// ends it early.
    pub async fn run_and_wait(&self, job: &str, parameters: &JobParameters) -> Result<BuildStatus, AppError> {
        let handle = self.trigger(job, parameters).await?;

        self.wait_until_reachable(&handle).await?;
        self.pause(self.policy.grace_period, &handle).await?;
        let status = self.wait_for_completion(&handle).await?;

        info!(
            job = %handle.job,
            build_number = handle.build_number,
            status = %status,
            "Build finished"
        );
        Ok(status)
    }

    /// Poll until the build answers, backing off between attempts
    async fn wait_until_reachable(&self, handle: &InvocationHandle) -> Result<BuildState, AppError> {
        let attempts = self.policy.reachability_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.runner.poll_build(handle).await {
                Ok(state) => {
                    debug!(
                        job = %handle.job,
                        build_number = handle.build_number,
                        attempt,
                        "Build is reachable"
                    );
                    return Ok(state);
                }
                Err(source) if attempt >= attempts => {
                    return Err(AppError::BuildUnreachable {
                        job: handle.job.clone(),
                        number: handle.build_number,
                        attempts,
                        source,
                    });
                }
                Err(e) => {
                    if e.is_not_found() {
                        debug!(
                            job = %handle.job,
                            build_number = handle.build_number,
                            attempt,
                            "Build not reachable yet: {}",
                            e
                        );
                    } else {
                        warn!(
                            job = %handle.job,
                            build_number = handle.build_number,
                            attempt,
                            "Failed to reach build: {}",
                            e
                        );
                    }
                    self.pause(self.policy.backoff_unit * attempt, handle).await?;
                    attempt += 1;
                }
            }
        }
    }

    async fn wait_for_completion(&self, handle: &InvocationHandle) -> Result<BuildStatus, AppError> {
        loop {
            match self.runner.poll_build(handle).await {
                Ok(BuildState::Finished(status)) => return Ok(status),
                Ok(state) => trace!(
                    job = %handle.job,
                    build_number = handle.build_number,
                    "Build still in progress: {:?}",
                    state
                ),
                Err(e) if e.is_transient() => warn!(
                    job = %handle.job,
                    build_number = handle.build_number,
                    "Failed to poll build, retrying: {}",
                    e
                ),
                // keeps waiting: only a finished build or shutdown ends the loop
                Err(e) => error!(
                    job = %handle.job,
                    build_number = handle.build_number,
                    "Polling build keeps failing: {}",
                    e
                ),
            }

            self.pause(self.policy.poll_interval, handle).await?;
        }
    }

    async fn pause(&self, duration: Duration, handle: &InvocationHandle) -> Result<(), AppError> {
        if self.shutdown.sleep(duration).await {
            Ok(())
        } else {
            Err(AppError::Cancelled {
                job: handle.job.clone(),
                number: handle.build_number,
            })
        }
    }
}
