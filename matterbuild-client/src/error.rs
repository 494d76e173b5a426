//! Error types for the job runner client

use thiserror::Error;

/// Result type alias for job runner operations
pub type Result<T> = std::result::Result<T, JobRunnerError>;

/// Errors that can occur when talking to the job runner
#[derive(Debug, Error)]
pub enum JobRunnerError {
    /// The job runner could not be reached
    #[error("Unable to connect to the job runner")]
    ConnectionFailed(#[from] reqwest::Error),

    /// The named job does not exist
    #[error("Unable to get job {0}")]
    JobNotFound(String),

    /// The build is not (yet) queryable
    #[error("Unable to get build #{number} of {job}")]
    BuildNotFound {
        /// Job name
        job: String,
        /// Build number that was requested
        number: u64,
    },

    /// The job runner answered with an error status
    #[error("Job runner rejected the request (status {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error body returned by the job runner
        message: String,
    },

    /// Failed to parse a response
    #[error("Failed to parse job runner response: {0}")]
    ParseError(String),

    /// The last successful build archived nothing
    #[error("No artifact found for the last successful build of {0}")]
    NoArtifact(String),
}

/// Longest error body kept from a rejected request
const MAX_MESSAGE_LEN: usize = 300;

impl JobRunnerError {
    /// Create a rejection from status code and response body
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        let message: String = message.into();
        let message = if message.chars().count() > MAX_MESSAGE_LEN {
            let mut truncated: String = message.chars().take(MAX_MESSAGE_LEN).collect();
            truncated.push('…');
            truncated
        } else {
            message
        };

        Self::Rejected {
            status,
            message: message.trim().to_string(),
        }
    }

    /// Check if this error means the job or build does not exist (yet)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::JobNotFound(_) | Self::BuildNotFound { .. })
            || matches!(self, Self::Rejected { status: 404, .. })
    }

    /// Check if retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::BuildNotFound { .. })
            || matches!(self, Self::Rejected { status, .. } if *status >= 500)
    }
}
