//! Slash command grammar
//!
//! The free text after the slash command is split into words with
//! `shell-words` and parsed by clap into a typed [`Action`]. Positional
//! arguments are optional at this level so each handler can answer a missing
//! argument with its own message.

use clap::{ColorChoice, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "matterbuild",
    about = "Control of the build system through slash commands",
    no_binary_name = true,
    disable_version_flag = true,
    arg_required_else_help = true,
    color = ColorChoice::Never
)]
struct CommandLine {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Action {
    /// Cut a release. Versions look like 0.0.0-rc0, or 0.0.0 for final releases
    #[command(name = "cut-release", visible_alias = "cut")]
    CutRelease {
        version: Option<String>,
        /// Release a version that is not on the newest release line
        #[arg(long)]
        backport: bool,
        /// Run the release job without pushing tags or artifacts
        #[arg(long)]
        dryrun: bool,
    },

    /// Show the configuration of a job
    #[command(name = "dump-job-config", visible_alias = "seeconf")]
    DumpJobConfig { job: Option<String> },

    /// Point the CI servers at a branch
    #[command(name = "set-ci-branch", visible_alias = "setci")]
    SetCiBranch { branch: Option<String> },

    /// Run a job with optional KEY=VALUE parameters
    #[command(name = "run-job", visible_alias = "runjob")]
    RunJob {
        job: Option<String>,
        parameters: Vec<String>,
    },

    /// Set the target of the pre-release job
    #[command(name = "set-pre-release-target", visible_alias = "setprerelease")]
    SetPreReleaseTarget { target: Option<String> },

    /// Status of the latest release job
    #[command(name = "check-release-status", visible_alias = "cutstatus")]
    CheckReleaseStatus,

    /// Lock the translation server to the given branches
    #[command(name = "lock-translation-branches", visible_alias = "lockpootle")]
    LockTranslationBranches {
        /// Server branch
        #[arg(long)]
        plt: Option<String>,
        /// Webapp branch
        #[arg(long)]
        web: Option<String>,
        /// Mobile branch
        #[arg(long)]
        mobile: Option<String>,
    },

    /// Show the branches the translation server is locked to
    #[command(name = "check-translation-branches", visible_alias = "getpootle")]
    CheckTranslationBranches,

    /// Merge a release branch back
    #[command(name = "merge-release-branch", visible_alias = "merge")]
    MergeReleaseBranch {
        /// Release branch to merge, e.g. release-5.3
        #[arg(long)]
        release: Option<String>,
    },

    /// Deploy a build to the loadtest cluster
    #[command(name = "run-loadtest", visible_alias = "loadtest")]
    RunLoadtest {
        build_tag: Option<String>,
        /// Test length in minutes
        #[arg(short, long, default_value_t = 20)]
        length: u32,
        /// Delay before profiling, in minutes
        #[arg(short, long, default_value_t = 15)]
        delay: u32,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::CutRelease { .. } => "cut-release",
            Action::DumpJobConfig { .. } => "dump-job-config",
            Action::SetCiBranch { .. } => "set-ci-branch",
            Action::RunJob { .. } => "run-job",
            Action::SetPreReleaseTarget { .. } => "set-pre-release-target",
            Action::CheckReleaseStatus => "check-release-status",
            Action::LockTranslationBranches { .. } => "lock-translation-branches",
            Action::CheckTranslationBranches => "check-translation-branches",
            Action::MergeReleaseBranch { .. } => "merge-release-branch",
            Action::RunLoadtest { .. } => "run-loadtest",
        }
    }

    pub fn is_release_cut(&self) -> bool {
        matches!(self, Action::CutRelease { .. })
    }
}

/// Why the command text did not yield an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// The text could not be split into words (e.g. an unclosed quote)
    Malformed(String),
    /// Help, usage, or an unknown command, rendered for the caller
    Usage(String),
}

pub fn parse_action(text: &str) -> Result<Action, ParseFailure> {
    let words = shell_words::split(text)
        .map_err(|e| ParseFailure::Malformed(format!("Unable to parse command: {}", e)))?;

    CommandLine::try_parse_from(words)
        .map(|line| line.action)
        .map_err(|e| ParseFailure::Usage(e.to_string()))
}
