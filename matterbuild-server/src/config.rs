//! Server configuration
//!
//! Loaded once at startup from a JSON file, with a handful of environment
//! overrides for deployment secrets. The result is shared read-only as
//! `Arc<Config>`; nothing mutates it after `load` returns.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Matterbuild configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to (e.g., "0.0.0.0:8080")
    pub listen_address: String,

    /// Job runner connection
    pub jenkins: JenkinsConfig,

    /// Slash command tokens accepted from the chat server
    pub allowed_tokens: Vec<String>,

    /// User ids allowed to run any command
    pub allowed_users: Vec<String>,

    /// User ids additionally allowed to cut releases
    pub release_users: Vec<String>,

    /// Job names for each workflow stage
    pub jobs: JobNames,

    /// Jobs whose branch pointer follows the current release
    pub ci_server_jobs: Vec<String>,

    /// How CI branch pointers name their upstream trigger project
    pub upstream: UpstreamConfig,

    /// Public artifact server probed by the backport guard
    pub release_artifacts_url: String,

    /// Build polling policy
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JenkinsConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Names of the remote jobs each action triggers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobNames {
    pub release: String,
    pub pre_checks: String,
    pub pre_release: String,
    /// Deployment job triggered with the full version after a release
    pub release_deploy: String,
    pub translation_server: String,
    pub check_translation_server: String,
    pub kube_deploy: String,
    pub merge_release: String,
}

impl Default for JobNames {
    fn default() -> Self {
        Self {
            release: "mattermost-cut-release".to_string(),
            pre_checks: "mattermost-release-prechecks".to_string(),
            pre_release: "mattermost-pre-release".to_string(),
            release_deploy: "build-pushes/job/release-gitlab.mattermost.com".to_string(),
            translation_server: "translation-server-lock".to_string(),
            check_translation_server: "translation-server-check".to_string(),
            kube_deploy: "kube-deploy".to_string(),
            merge_release: "merge-release-branch".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream project CI follows when pointed at `master`
    pub enterprise_project: String,
    /// Prefix of the upstream project for every other branch
    pub platform_prefix: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            enterprise_project: "mattermost-enterprise".to_string(),
            platform_prefix: "platform-repo".to_string(),
        }
    }
}

/// Timings of the build poller, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// How many times to look for a freshly triggered build before giving up
    pub reachability_attempts: u32,
    /// Backoff after attempt `n` is `n * backoff_unit_secs`
    pub backoff_unit_secs: u64,
    /// Pause between finding the build and waiting for it to finish
    pub grace_period_secs: u64,
    pub poll_interval_secs: u64,
}

impl PollingConfig {
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_secs(self.backoff_unit_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            reachability_attempts: 5,
            backoff_unit_secs: 1,
            grace_period_secs: 5,
            poll_interval_secs: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            jenkins: JenkinsConfig {
                url: "http://localhost:8081".to_string(),
                ..JenkinsConfig::default()
            },
            allowed_tokens: Vec::new(),
            allowed_users: Vec::new(),
            release_users: Vec::new(),
            jobs: JobNames::default(),
            ci_server_jobs: Vec::new(),
            upstream: UpstreamConfig::default(),
            release_artifacts_url: "http://releases.mattermost.com".to_string(),
            polling: PollingConfig::default(),
        }
    }
}

impl Config {
    /// Loads, overrides from the environment and validates
    ///
    /// A missing file is not an error: the defaults plus environment
    /// overrides are used instead.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::info!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Applies overrides from environment variables
    ///
    /// Recognized variables:
    /// - MATTERBUILD_LISTEN_ADDRESS
    /// - JENKINS_URL
    /// - JENKINS_USERNAME
    /// - JENKINS_PASSWORD
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("MATTERBUILD_LISTEN_ADDRESS") {
            self.listen_address = value;
        }
        if let Some(value) = lookup("JENKINS_URL") {
            self.jenkins.url = value;
        }
        if let Some(value) = lookup("JENKINS_USERNAME") {
            self.jenkins.username = value;
        }
        if let Some(value) = lookup("JENKINS_PASSWORD") {
            self.jenkins.password = value;
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.listen_address.is_empty() {
            anyhow::bail!("listen_address cannot be empty");
        }

        if !self.jenkins.url.starts_with("http://") && !self.jenkins.url.starts_with("https://") {
            anyhow::bail!("jenkins.url must start with http:// or https://");
        }

        if self.polling.reachability_attempts == 0 {
            anyhow::bail!("polling.reachability_attempts must be greater than 0");
        }

        if self.polling.poll_interval_secs == 0 {
            anyhow::bail!("polling.poll_interval_secs must be greater than 0");
        }

        if self.allowed_tokens.is_empty() {
            tracing::warn!("No allowed tokens configured; every slash command will be rejected");
        }

        Ok(())
    }
}
