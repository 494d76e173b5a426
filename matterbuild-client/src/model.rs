//! Wire models for the Jenkins JSON API
//!
//! Only the fields Matterbuild reads are modeled; everything else in the
//! (large) Jenkins payloads is ignored.

use matterbuild_core::domain::build::{BuildState, BuildStatus, BuildSummary};
use serde::Deserialize;
use std::time::Duration;

/// `GET job/<name>/api/json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobInfo {
    pub next_build_number: u64,
}

/// `GET job/<name>/<number>/api/json`
#[derive(Debug, Deserialize)]
pub(crate) struct BuildInfo {
    pub number: u64,
    #[serde(default)]
    pub building: bool,
    pub result: Option<String>,
    /// Milliseconds; zero while the build is running
    #[serde(default)]
    pub duration: u64,
    /// Start time in milliseconds since the epoch
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArtifactInfo {
    pub relative_path: String,
}

impl BuildInfo {
    pub fn state(&self) -> BuildState {
        if self.building {
            return BuildState::Running;
        }

        match self.result.as_deref() {
            Some(result) => BuildState::Finished(BuildStatus::from_native(result)),
            None => BuildState::Unstarted,
        }
    }

    pub fn status(&self) -> BuildStatus {
        match self.state() {
            BuildState::Unstarted => BuildStatus::Pending,
            BuildState::Running => BuildStatus::Running,
            BuildState::Finished(status) => status,
        }
    }

    pub fn into_summary(self, job: &str) -> BuildSummary {
        BuildSummary {
            job: job.to_string(),
            number: self.number,
            status: self.status(),
            duration: Duration::from_millis(self.duration),
            started_at: self
                .timestamp
                .and_then(chrono::DateTime::from_timestamp_millis),
        }
    }
}
