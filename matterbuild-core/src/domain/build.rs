//! Build domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Parameters passed to a job invocation
///
/// Ordered so that the same invocation always serializes the same way.
pub type JobParameters = BTreeMap<String, String>;

/// Terminal or in-flight status of a single build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildStatus {
    Pending,
    Running,
    Success,
    Failure,
    Unstable,
    Aborted,
    Unknown,
}

impl BuildStatus {
    /// Parses the job runner's native result vocabulary ("SUCCESS", "FAILURE", ...)
    ///
    /// Anything unrecognised maps to `Unknown` rather than failing; the caller
    /// only ever branches on `Success`.
    pub fn from_native(result: &str) -> Self {
        match result.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "UNSTABLE" => Self::Unstable,
            "ABORTED" => Self::Aborted,
            "PENDING" | "NOT_BUILT" => Self::Pending,
            "RUNNING" | "BUILDING" => Self::Running,
            _ => Self::Unknown,
        }
    }

    /// The job runner's native spelling of this status
    pub fn as_native(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Unstable => "UNSTABLE",
            Self::Aborted => "ABORTED",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Attachment color used when rendering this status in chat
    pub fn color(&self) -> &'static str {
        match self {
            Self::Success => "#36a64f",
            Self::Failure => "#ee2116",
            Self::Unstable => "#ffc107",
            Self::Pending | Self::Running => "#0060aa",
            Self::Aborted | Self::Unknown => "#8b8b8b",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_native())
    }
}

/// Observed state of a build while polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Queued or otherwise registered but not yet executing
    Unstarted,
    Running,
    Finished(BuildStatus),
}

/// A triggered build of a named job
///
/// The build number is the one the job runner announced it would assign
/// before the invocation was sent, so the handle addresses this exact build
/// and never "whatever ran last".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationHandle {
    pub job: String,
    pub build_number: u64,
    pub parameters: JobParameters,
}

/// Summary of a job's most recent build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub job: String,
    pub number: u64,
    pub status: BuildStatus,
    pub duration: Duration,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl BuildSummary {
    pub fn color(&self) -> &'static str {
        self.status.color()
    }

    /// Human readable duration, e.g. "12 min 5 sec"
    pub fn duration_display(&self) -> String {
        format_duration(self.duration)
    }
}

/// Formats a build duration at minute granularity the way chat users read it
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let minutes = total / 60;
    let seconds = total % 60;

    if minutes == 0 {
        format!("{} sec", seconds)
    } else {
        format!("{} min {} sec", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_status_parsing() {
        assert_eq!(BuildStatus::from_native("SUCCESS"), BuildStatus::Success);
        assert_eq!(BuildStatus::from_native("failure"), BuildStatus::Failure);
        assert_eq!(BuildStatus::from_native("UNSTABLE"), BuildStatus::Unstable);
        assert_eq!(BuildStatus::from_native("ABORTED"), BuildStatus::Aborted);
        assert_eq!(BuildStatus::from_native("NOT_BUILT"), BuildStatus::Pending);
        assert_eq!(BuildStatus::from_native("weird"), BuildStatus::Unknown);
    }

    #[test]
    fn test_only_success_is_success() {
        assert!(BuildStatus::Success.is_success());
        for status in [
            BuildStatus::Pending,
            BuildStatus::Running,
            BuildStatus::Failure,
            BuildStatus::Unstable,
            BuildStatus::Aborted,
            BuildStatus::Unknown,
        ] {
            assert!(!status.is_success(), "{} must not count as success", status);
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42 sec");
        assert_eq!(format_duration(Duration::from_millis(725_300)), "12 min 5 sec");
    }
}
