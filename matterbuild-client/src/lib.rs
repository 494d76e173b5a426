//! Matterbuild Job Runner Client
//!
//! A type-safe HTTP client for the Jenkins REST API, plus the [`JobRunner`]
//! trait the rest of Matterbuild programs against.
//!
//! The server never talks to Jenkins directly; it holds an
//! `Arc<dyn JobRunner>` so the poller and the release workflow can be driven
//! by an in-memory runner in tests.
//!
//! # Example
//!
//! ```no_run
//! use matterbuild_client::JenkinsClient;
//! use matterbuild_core::domain::build::JobParameters;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = JenkinsClient::new("https://jenkins.example.com")
//!         .with_credentials("bot", "api-token");
//!
//!     let handle = client.invoke("mattermost-prechecks", &JobParameters::new()).await?;
//!     println!("Triggered build #{}", handle.build_number);
//!     Ok(())
//! }
//! ```

mod builds;
pub mod error;
mod jobs;
mod model;
pub mod runner;

// Re-export commonly used types
pub use error::{JobRunnerError, Result};
pub use runner::JobRunner;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// Basic-auth credentials for the job runner
#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP client for the Jenkins API
///
/// Methods are organized into logical groups:
/// - Jobs: invoke, read and write configuration
/// - Builds: poll a specific build, latest result, artifacts
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    /// Base URL of Jenkins (e.g., "https://jenkins.example.com")
    base_url: String,
    /// HTTP client instance
    client: Client,
    credentials: Option<Credentials>,
}

impl JenkinsClient {
    /// Create a new Jenkins client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of Jenkins (e.g., "https://jenkins.example.com")
    ///
    /// # Example
    /// ```
    /// use matterbuild_client::JenkinsClient;
    ///
    /// let client = JenkinsClient::new("https://jenkins.example.com");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new Jenkins client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials: None,
        }
    }

    /// Authenticate every request with HTTP basic auth
    ///
    /// Jenkins accepts an API token in place of the password.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        self.credentials = if username.is_empty() {
            None
        } else {
            Some(Credentials {
                username,
                password: password.into(),
            })
        };
        self
    }

    /// Get the base URL of Jenkins
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a job, addressing folders as nested `job/` segments
    ///
    /// `folder/name` becomes `job/folder/job/name`; names that already spell
    /// out `/job/` are used as given.
    pub fn job_url(&self, job: &str) -> String {
        let job = job.trim_matches('/');
        let path = if job.contains("/job/") {
            job.to_string()
        } else {
            job.split('/').collect::<Vec<_>>().join("/job/")
        };
        format!("{}/job/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some(credentials) => {
                builder.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code, mapping 404 to the caller's notion of "missing"
    async fn check_status(
        &self,
        response: reqwest::Response,
        not_found: impl FnOnce() -> JobRunnerError,
    ) -> Result<reqwest::Response> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(JobRunnerError::rejected(status.as_u16(), error_text));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        not_found: impl FnOnce() -> JobRunnerError,
    ) -> Result<T> {
        self.check_status(response, not_found)
            .await?
            .json()
            .await
            .map_err(|e| JobRunnerError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is plain text (config XML, artifacts)
    async fn handle_text_response(
        &self,
        response: reqwest::Response,
        not_found: impl FnOnce() -> JobRunnerError,
    ) -> Result<String> {
        Ok(self.check_status(response, not_found).await?.text().await?)
    }

    /// Handle an API response that returns no useful content
    async fn handle_empty_response(
        &self,
        response: reqwest::Response,
        not_found: impl FnOnce() -> JobRunnerError,
    ) -> Result<()> {
        self.check_status(response, not_found).await?;
        Ok(())
    }
}
