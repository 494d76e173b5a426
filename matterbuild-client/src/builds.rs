//! Build-related API endpoints

use matterbuild_core::domain::build::{BuildState, BuildSummary, InvocationHandle};
use reqwest::Method;

use crate::JenkinsClient;
use crate::error::{JobRunnerError, Result};
use crate::model::BuildInfo;

impl JenkinsClient {
    // =============================================================================
    // Build Status
    // =============================================================================

    /// Poll one specific build by number
    ///
    /// A build that has been queued but not yet scheduled is not queryable
    /// and reports [`JobRunnerError::BuildNotFound`].
    pub async fn poll_build(&self, handle: &InvocationHandle) -> Result<BuildState> {
        let url = format!(
            "{}/{}/api/json",
            self.job_url(&handle.job),
            handle.build_number
        );
        let response = self.request(Method::GET, &url).send().await?;

        let build: BuildInfo = self
            .handle_response(response, || JobRunnerError::BuildNotFound {
                job: handle.job.clone(),
                number: handle.build_number,
            })
            .await?;

        Ok(build.state())
    }

    /// Summary of the most recent build of a job
    pub async fn latest_result(&self, job: &str) -> Result<BuildSummary> {
        let url = format!("{}/lastBuild/api/json", self.job_url(job));
        let response = self.request(Method::GET, &url).send().await?;

        let build: BuildInfo = self
            .handle_response(response, || JobRunnerError::JobNotFound(job.to_string()))
            .await?;

        Ok(build.into_summary(job))
    }

    // =============================================================================
    // Artifacts
    // =============================================================================

    /// Text content of the first artifact archived by the last successful build
    pub async fn latest_artifact(&self, job: &str) -> Result<String> {
        let build_url = format!("{}/lastSuccessfulBuild", self.job_url(job));
        let response = self
            .request(Method::GET, &format!("{}/api/json", build_url))
            .send()
            .await?;

        let build: BuildInfo = self
            .handle_response(response, || JobRunnerError::JobNotFound(job.to_string()))
            .await?;

        let artifact = build
            .artifacts
            .first()
            .ok_or_else(|| JobRunnerError::NoArtifact(job.to_string()))?;

        let url = format!("{}/artifact/{}", build_url, artifact.relative_path);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_text_response(response, || JobRunnerError::NoArtifact(job.to_string()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use matterbuild_core::domain::build::{BuildStatus, JobParameters};
    use serde_json::json;

    fn handle(job: &str, build_number: u64) -> InvocationHandle {
        InvocationHandle {
            job: job.to_string(),
            build_number,
            parameters: JobParameters::new(),
        }
    }

    #[tokio::test]
    async fn test_poll_specific_build() {
        let server = MockServer::start_async().await;
        let poll = server
            .mock_async(|when, then| {
                when.method(GET).path("/job/prechecks/12/api/json");
                then.status(200)
                    .json_body(json!({ "number": 12, "building": false, "result": "FAILURE" }));
            })
            .await;

        let client = JenkinsClient::new(server.base_url());
        let state = client.poll_build(&handle("prechecks", 12)).await.unwrap();

        poll.assert_async().await;
        assert_eq!(state, BuildState::Finished(BuildStatus::Failure));
    }

    #[tokio::test]
    async fn test_poll_running_build() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/job/prechecks/13/api/json");
                then.status(200)
                    .json_body(json!({ "number": 13, "building": true, "result": null }));
            })
            .await;

        let client = JenkinsClient::new(server.base_url());
        let state = client.poll_build(&handle("prechecks", 13)).await.unwrap();
        assert_eq!(state, BuildState::Running);
    }

    #[tokio::test]
    async fn test_poll_build_not_yet_queryable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/job/prechecks/14/api/json");
                then.status(404);
            })
            .await;

        let client = JenkinsClient::new(server.base_url());
        let err = client
            .poll_build(&handle("prechecks", 14))
            .await
            .unwrap_err();

        assert!(matches!(err, JobRunnerError::BuildNotFound { number: 14, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_latest_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/job/cut-release/lastBuild/api/json");
                then.status(200).json_body(json!({
                    "number": 88,
                    "building": false,
                    "result": "SUCCESS",
                    "duration": 61000,
                    "timestamp": 1500000000000i64
                }));
            })
            .await;

        let client = JenkinsClient::new(server.base_url());
        let summary = client.latest_result("cut-release").await.unwrap();

        assert_eq!(summary.number, 88);
        assert_eq!(summary.status, BuildStatus::Success);
        assert_eq!(summary.duration_display(), "1 min 1 sec");
    }

    #[tokio::test]
    async fn test_latest_artifact() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/job/check-pootle/lastSuccessfulBuild/api/json");
                then.status(200).json_body(json!({
                    "number": 5,
                    "result": "SUCCESS",
                    "artifacts": [{ "fileName": "branches.txt", "relativePath": "out/branches.txt" }]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/job/check-pootle/lastSuccessfulBuild/artifact/out/branches.txt");
                then.status(200).body("PLT_BRANCH=\"release-5.3\"\n");
            })
            .await;

        let client = JenkinsClient::new(server.base_url());
        let text = client.latest_artifact("check-pootle").await.unwrap();
        assert_eq!(text, "PLT_BRANCH=\"release-5.3\"\n");
    }

    #[tokio::test]
    async fn test_latest_artifact_missing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/job/check-pootle/lastSuccessfulBuild/api/json");
                then.status(200)
                    .json_body(json!({ "number": 5, "result": "SUCCESS", "artifacts": [] }));
            })
            .await;

        let client = JenkinsClient::new(server.base_url());
        let err = client.latest_artifact("check-pootle").await.unwrap_err();
        assert!(matches!(err, JobRunnerError::NoArtifact(_)));
    }
}
