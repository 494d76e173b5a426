//! Job-related API endpoints

use matterbuild_core::domain::build::{InvocationHandle, JobParameters};
use reqwest::Method;
use tracing::debug;

use crate::JenkinsClient;
use crate::error::{JobRunnerError, Result};
use crate::model::JobInfo;

impl JenkinsClient {
    // =============================================================================
    // Job Invocation
    // =============================================================================

    /// Trigger a build of a job
    ///
    /// The build number is read from the job *before* the build is queued, so
    /// the returned handle names the build this call started even when other
    /// triggers of the same job race with it.
    ///
    /// # Arguments
    /// * `job` - Job name; folders are separated by `/`
    /// * `parameters` - Build parameters; empty triggers a parameterless build
    ///
    /// # Returns
    /// A handle for polling the triggered build
    pub async fn invoke(&self, job: &str, parameters: &JobParameters) -> Result<InvocationHandle> {
        let info = self.job_info(job).await?;

        let endpoint = if parameters.is_empty() {
            "build"
        } else {
            "buildWithParameters"
        };
        let url = format!("{}/{}", self.job_url(job), endpoint);

        let response = self
            .request(Method::POST, &url)
            .query(parameters)
            .send()
            .await?;

        self.handle_empty_response(response, || JobRunnerError::JobNotFound(job.to_string()))
            .await?;

        debug!(
            job = %job,
            build_number = info.next_build_number,
            "Invoked job"
        );

        Ok(InvocationHandle {
            job: job.to_string(),
            build_number: info.next_build_number,
            parameters: parameters.clone(),
        })
    }

    async fn job_info(&self, job: &str) -> Result<JobInfo> {
        let url = format!("{}/api/json", self.job_url(job));
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response, || JobRunnerError::JobNotFound(job.to_string()))
            .await
    }

    // =============================================================================
    // Job Configuration
    // =============================================================================

    /// Fetch the XML configuration of a job
    pub async fn job_config(&self, job: &str) -> Result<String> {
        let url = format!("{}/config.xml", self.job_url(job));
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_text_response(response, || JobRunnerError::JobNotFound(job.to_string()))
            .await
    }

    /// Replace the XML configuration of a job
    pub async fn update_job_config(&self, job: &str, config: &str) -> Result<()> {
        let url = format!("{}/config.xml", self.job_url(job));
        let response = self
            .request(Method::POST, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(config.to_string())
            .send()
            .await?;

        self.handle_empty_response(response, || JobRunnerError::JobNotFound(job.to_string()))
            .await
    }
}
