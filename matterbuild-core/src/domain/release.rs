//! Release domain types
//!
//! A release is named by a version string that is either a final release
//! (`MAJOR.MINOR.PATCH`) or a release candidate (`MAJOR.MINOR.PATCH-rcN`).
//! Everything the release workflow needs (job parameters, branch names, the
//! backport probe target) is derived from the parsed version here, so that no
//! job is ever invoked with a version that failed the grammar.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced while parsing a release version string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("You need to specify a release version.")]
    Missing,

    #[error("Bad version argument \"{0}\". Expected 0.0.0 or 0.0.0-rc0.")]
    Malformed(String),
}

/// A parsed release version
///
/// The release and candidate parts are kept exactly as written; the numeric
/// major and minor only feed the derived branch and next-minor names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseVersion {
    release_part: String,
    rc_part: String,
    major: u64,
    minor: u64,
    next_minor: u64,
}

impl ReleaseVersion {
    /// Parses `MAJOR.MINOR.PATCH` or `MAJOR.MINOR.PATCH-rcN`
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(VersionError::Missing);
        }

        let malformed = || VersionError::Malformed(input.to_string());

        let (release, rc) = match input.split_once('-') {
            Some((release, suffix)) => {
                let number = suffix.strip_prefix("rc").ok_or_else(malformed)?;
                if !is_digits(number) {
                    return Err(malformed());
                }
                (release, suffix)
            }
            None => (input, ""),
        };

        let mut parts = release.split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if !is_digits(patch) {
            return Err(malformed());
        }

        let major = parse_number(major).ok_or_else(malformed)?;
        let minor = parse_number(minor).ok_or_else(malformed)?;
        let next_minor = minor.checked_add(1).ok_or_else(malformed)?;

        Ok(Self {
            release_part: release.to_string(),
            rc_part: rc.to_string(),
            major,
            minor,
            next_minor,
        })
    }

    /// The numeric portion as written, e.g. `5.3.0`
    pub fn release_part(&self) -> &str {
        &self.release_part
    }

    /// The candidate label, e.g. `rc1`, or an empty string for final releases
    pub fn rc_part(&self) -> &str {
        &self.rc_part
    }

    /// True for the first candidate of a new `.0` minor version
    ///
    /// That build is the one that cuts the release branch.
    pub fn is_first_minor_release(&self) -> bool {
        self.rc_part == "rc1" && self.release_part.ends_with(".0")
    }

    /// `MAJOR.(MINOR+1).0`, the version whose existence marks a backport
    pub fn next_minor(&self) -> String {
        format!("{}.{}.0", self.major, self.next_minor)
    }

    /// Release branch for this version line, e.g. `release-5.3`
    pub fn release_branch(&self) -> String {
        format!("release-{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.release_part)?;
        if !self.rc_part.is_empty() {
            write!(f, "-{}", self.rc_part)?;
        }
        Ok(())
    }
}

/// Digits only; rejects signs, whitespace and empty strings that `u64::from_str` would
/// otherwise let through or report less clearly
fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_number(s: &str) -> Option<u64> {
    if !is_digits(s) {
        return None;
    }
    s.parse().ok()
}

/// Everything one release-cut workflow needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub version: ReleaseVersion,
    pub backport: bool,
    pub dry_run: bool,
}

impl ReleaseDescriptor {
    pub fn parse(version: &str, backport: bool, dry_run: bool) -> Result<Self, VersionError> {
        Ok(Self {
            version: ReleaseVersion::parse(version)?,
            backport,
            dry_run,
        })
    }

    pub fn release_part(&self) -> &str {
        self.version.release_part()
    }

    pub fn is_first_minor_release(&self) -> bool {
        self.version.is_first_minor_release()
    }

    /// Full version string, e.g. `5.3.0-rc1` or `5.3.0`
    pub fn full_version(&self) -> String {
        self.version.to_string()
    }

    /// Value of the release job's rc parameter: `-rc1` or empty
    pub fn rc_suffix(&self) -> String {
        match self.version.rc_part() {
            "" => String::new(),
            rc => format!("-{}", rc),
        }
    }

    /// Whether the CI and pre-release pointers move once the release job succeeds
    pub fn updates_pointers(&self) -> bool {
        !self.backport && !self.dry_run
    }
}
