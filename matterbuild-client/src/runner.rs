//! The job runner contract
//!
//! Everything Matterbuild needs from a remote build system. [`JenkinsClient`]
//! is the production implementation; tests substitute scripted runners.

use async_trait::async_trait;
use matterbuild_core::domain::build::{BuildState, BuildSummary, InvocationHandle, JobParameters};

use crate::JenkinsClient;
use crate::error::Result;

/// A remote system that runs named, parameterized jobs
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Start (or queue) a build and report the build number it will get
    async fn invoke(&self, job: &str, parameters: &JobParameters) -> Result<InvocationHandle>;

    /// Observe the build a handle refers to
    async fn poll_build(&self, handle: &InvocationHandle) -> Result<BuildState>;

    /// Summary of the job's most recent build
    async fn latest_result(&self, job: &str) -> Result<BuildSummary>;

    /// Opaque configuration document of a job
    async fn job_config(&self, job: &str) -> Result<String>;

    /// Replace the configuration document of a job
    async fn update_job_config(&self, job: &str, config: &str) -> Result<()>;

    /// Text of the artifact archived by the job's last successful build
    async fn latest_artifact(&self, job: &str) -> Result<String>;
}

#[async_trait]
impl JobRunner for JenkinsClient {
    async fn invoke(&self, job: &str, parameters: &JobParameters) -> Result<InvocationHandle> {
        JenkinsClient::invoke(self, job, parameters).await
    }

    async fn poll_build(&self, handle: &InvocationHandle) -> Result<BuildState> {
        JenkinsClient::poll_build(self, handle).await
    }

    async fn latest_result(&self, job: &str) -> Result<BuildSummary> {
        JenkinsClient::latest_result(self, job).await
    }

    async fn job_config(&self, job: &str) -> Result<String> {
        JenkinsClient::job_config(self, job).await
    }

    async fn update_job_config(&self, job: &str, config: &str) -> Result<()> {
        JenkinsClient::update_job_config(self, job, config).await
    }

    async fn latest_artifact(&self, job: &str) -> Result<String> {
        JenkinsClient::latest_artifact(self, job).await
    }
}
