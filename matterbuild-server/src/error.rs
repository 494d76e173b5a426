//! Server error type
//!
//! Every action handler returns [`AppError`]; the dispatcher turns it into an
//! ephemeral response with [`AppError::render`].

use matterbuild_client::error::JobRunnerError;
use matterbuild_core::domain::build::BuildStatus;
use matterbuild_core::domain::release::VersionError;
use thiserror::Error;

use crate::service::auth::AuthError;
use crate::service::ci_config::ConfigUpdateError;

/// Separator between an error and its causes in rendered messages
const CAUSE_SEPARATOR: &str = " |:| ";

#[derive(Debug, Error)]
pub enum AppError {
    /// The job could not be started
    #[error("Unable to invoke job {job}")]
    InvokeFailed {
        job: String,
        #[source]
        source: JobRunnerError,
    },

    /// The triggered build never became queryable
    #[error("Unable to get build #{number} of {job} after {attempts} attempts")]
    BuildUnreachable {
        job: String,
        number: u64,
        attempts: u32,
        #[source]
        source: JobRunnerError,
    },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    ConfigUpdateFailed(#[from] ConfigUpdateError),

    /// A build this workflow depends on finished without success
    #[error("{message} Result: {status}")]
    JobFailed { message: String, status: BuildStatus },

    /// Shutdown was requested while waiting on a build
    #[error("Stopped waiting for build #{number} of {job}: server is shutting down")]
    Cancelled { job: String, number: u64 },

    #[error(transparent)]
    JobRunner(#[from] JobRunnerError),
}

impl AppError {
    /// Whether the request was refused before any remote work happened
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::InvalidVersion(_))
    }

    /// The error followed by each of its causes
    pub fn render(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);

        while let Some(cause) = source {
            message.push_str(CAUSE_SEPARATOR);
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        message
    }
}
