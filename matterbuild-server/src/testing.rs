//! Scripted collaborators for unit tests

use async_trait::async_trait;
use matterbuild_client::error::{JobRunnerError, Result};
use matterbuild_client::runner::JobRunner;
use matterbuild_core::domain::build::{
    BuildState, BuildStatus, BuildSummary, InvocationHandle, JobParameters,
};
use matterbuild_core::domain::command::SlashCommand;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::Config;
use crate::scheduler::PollPolicy;
use crate::service::probe::ReleaseProbe;

pub const TOKEN: &str = "valid-token";
pub const RELEASE_USER: &str = "release-manager";
pub const DEVELOPER: &str = "developer";

/// A poll policy that never sleeps
pub fn immediate_policy() -> PollPolicy {
    PollPolicy {
        reachability_attempts: 5,
        backoff_unit: Duration::ZERO,
        grace_period: Duration::ZERO,
        poll_interval: Duration::ZERO,
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.allowed_tokens = vec![TOKEN.to_string()];
    config.allowed_users = vec![RELEASE_USER.to_string(), DEVELOPER.to_string()];
    config.release_users = vec![RELEASE_USER.to_string()];
    config.ci_server_jobs = vec!["ci-linux".to_string(), "ci-windows".to_string()];
    config
}

pub fn slash_command(user_id: &str, text: &str) -> SlashCommand {
    SlashCommand {
        channel_id: "town-square-id".to_string(),
        channel_name: "town-square".to_string(),
        command: "/matterbuild".to_string(),
        team_name: "core".to_string(),
        team_id: "team-id".to_string(),
        text: text.to_string(),
        token: TOKEN.to_string(),
        user_id: user_id.to_string(),
        username: user_id.to_string(),
    }
}

/// A CI job configuration carrying both editable elements
pub const CI_JOB_CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <description>CI server</description>
  <properties>
    <hudson.model.ParametersDefinitionProperty>
      <parameterDefinitions>
        <hudson.model.StringParameterDefinition>
          <name>BRANCH</name>
          <defaultValue>master</defaultValue>
        </hudson.model.StringParameterDefinition>
      </parameterDefinitions>
    </hudson.model.ParametersDefinitionProperty>
  </properties>
  <triggers>
    <jenkins.triggers.ReverseBuildTrigger>
      <spec></spec>
      <upstreamProjects>mattermost-enterprise</upstreamProjects>
    </jenkins.triggers.ReverseBuildTrigger>
  </triggers>
</project>
"#;

#[derive(Default)]
struct RunnerState {
    next_builds: HashMap<String, u64>,
    missing_jobs: HashSet<String>,
    outcomes: HashMap<String, BuildStatus>,
    poll_script: VecDeque<Result<BuildState>>,
    default_state: Option<BuildState>,
    configs: HashMap<String, String>,
    rejected_updates: HashSet<String>,
    artifacts: HashMap<String, String>,
    latest: HashMap<String, BuildSummary>,
    invocations: Vec<InvocationHandle>,
    updated_configs: Vec<(String, String)>,
    polls: usize,
    poll_times: Vec<tokio::time::Instant>,
}

/// In-memory job runner driven by a script
///
/// Polls pop from the scripted queue first; once it is empty a build
/// finishes with its job's configured outcome (success by default).
#[derive(Default)]
pub struct FakeRunner {
    state: Mutex<RunnerState>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_next_build(self, job: &str, number: u64) -> Self {
        self.state.lock().unwrap().next_builds.insert(job.to_string(), number);
        self
    }

    pub fn with_missing_job(self, job: &str) -> Self {
        self.state.lock().unwrap().missing_jobs.insert(job.to_string());
        self
    }

    pub fn with_outcome(self, job: &str, status: BuildStatus) -> Self {
        self.state.lock().unwrap().outcomes.insert(job.to_string(), status);
        self
    }

    pub fn with_config(self, job: &str, xml: &str) -> Self {
        self.state.lock().unwrap().configs.insert(job.to_string(), xml.to_string());
        self
    }

    pub fn with_rejected_update(self, job: &str) -> Self {
        self.state.lock().unwrap().rejected_updates.insert(job.to_string());
        self
    }

    pub fn with_artifact(self, job: &str, text: &str) -> Self {
        self.state.lock().unwrap().artifacts.insert(job.to_string(), text.to_string());
        self
    }

    pub fn with_latest(self, summary: BuildSummary) -> Self {
        self.state.lock().unwrap().latest.insert(summary.job.clone(), summary);
        self
    }

    pub fn script_polls(&self, polls: Vec<Result<BuildState>>) {
        self.state.lock().unwrap().poll_script.extend(polls);
    }

    /// State reported once the script runs out, instead of finishing
    pub fn set_default_state(&self, state: BuildState) {
        self.state.lock().unwrap().default_state = Some(state);
    }

    pub fn poll_count(&self) -> usize {
        self.state.lock().unwrap().polls
    }

    /// Clock readings of every poll, in order
    pub fn poll_times(&self) -> Vec<tokio::time::Instant> {
        self.state.lock().unwrap().poll_times.clone()
    }

        pub fn invocations(&self) -> Vec<InvocationHandle> {
        self.state.lock().unwrap().invocations.clone()
    }

    pub fn invoked_jobs(&self) -> Vec<String> {
        self.invocations().into_iter().map(|h| h.job).collect()
    }

    pub fn updated_configs(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().updated_configs.clone()
    }

    /// Number of calls that reached the runner
    pub fn remote_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.invocations.len() + state.polls + state.updated_configs.len()
    }
}

#[async_trait]
impl JobRunner for FakeRunner {
    async fn invoke(&self, job: &str, parameters: &JobParameters) -> Result<InvocationHandle> {
        let mut state = self.state.lock().unwrap();
        if state.missing_jobs.contains(job) {
            return Err(JobRunnerError::JobNotFound(job.to_string()));
        }

        let number = state.next_builds.entry(job.to_string()).or_insert(1);
        let handle = InvocationHandle {
            job: job.to_string(),
            build_number: *number,
            parameters: parameters.clone(),
        };
        *number += 1;

        state.invocations.push(handle.clone());
        Ok(handle)
    }

    async fn poll_build(&self, handle: &InvocationHandle) -> Result<BuildState> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        state.poll_times.push(tokio::time::Instant::now());

        if let Some(next) = state.poll_script.pop_front() {
            return next;
        }
        if let Some(default) = state.default_state {
            return Ok(default);
        }

        let status = state
            .outcomes
            .get(&handle.job)
            .copied()
            .unwrap_or(BuildStatus::Success);
        Ok(BuildState::Finished(status))
    }

    async fn latest_result(&self, job: &str) -> Result<BuildSummary> {
        self.state
            .lock()
            .unwrap()
            .latest
            .get(job)
            .cloned()
            .ok_or_else(|| JobRunnerError::JobNotFound(job.to_string()))
    }

    async fn job_config(&self, job: &str) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .configs
            .get(job)
            .cloned()
            .ok_or_else(|| JobRunnerError::JobNotFound(job.to_string()))
    }

    async fn update_job_config(&self, job: &str, config: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.rejected_updates.contains(job) {
            return Err(JobRunnerError::rejected(403, "Forbidden"));
        }

        state.configs.insert(job.to_string(), config.to_string());
        state.updated_configs.push((job.to_string(), config.to_string()));
        Ok(())
    }

    async fn latest_artifact(&self, job: &str) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .artifacts
            .get(job)
            .cloned()
            .ok_or_else(|| JobRunnerError::NoArtifact(job.to_string()))
    }
}

/// Artifact probe with a fixed answer that counts its calls
pub struct FakeProbe {
    exists: bool,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(exists: bool) -> Self {
        Self {
            exists,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseProbe for FakeProbe {
    async fn future_release_exists(&self, _version: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.exists
    }
}
