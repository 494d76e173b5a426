//! Future release probe
//!
//! The backport guard asks whether a newer release line already has a
//! release candidate published. This is a heuristic: the artifact server is
//! eventually consistent with the release jobs, so a "no" only means nothing
//! has been uploaded yet.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Upper bound on one probe so a stalled artifact server cannot hold up a cut
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait ReleaseProbe: Send + Sync {
    /// Whether the first release candidate of `version` has been published
    async fn future_release_exists(&self, version: &str) -> bool;
}

/// Probes the public artifact server over HTTP
#[derive(Debug, Clone)]
pub struct HttpReleaseProbe {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpReleaseProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Linux server tarball of the version's first release candidate
    pub fn artifact_url(&self, version: &str) -> String {
        format!(
            "{}/{version}-rc1/mattermost-{version}-rc1-linux-amd64.tar.gz",
            self.base_url
        )
    }
}

#[async_trait]
impl ReleaseProbe for HttpReleaseProbe {
    async fn future_release_exists(&self, version: &str) -> bool {
        let url = self.artifact_url(version);

        match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Probed future release");
                response.status() == StatusCode::OK
            }
            Err(e) => {
                debug!(url = %url, "Future release probe failed: {}", e);
                false
            }
        }
    }
}
