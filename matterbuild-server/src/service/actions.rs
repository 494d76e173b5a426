//! Action handlers
//!
//! One handler per [`Action`]. Each checks its own required arguments before
//! any remote call.

use matterbuild_core::domain::build::JobParameters;
use matterbuild_core::dto::slash::{ERROR_COLOR, INFO_COLOR, ResponseType, SlashResponse};
use std::fmt;
use tracing::{info, warn};

use crate::error::AppError;
use crate::service::command::Action;
use crate::service::dispatch::Dispatcher;
use crate::service::release::ReleaseTicket;

const TRANSLATION_TITLE: &str = "Translation Server Update";

/// Labels for the branch variables the translation jobs work with
const TRANSLATION_BRANCHES: [(&str, &str); 3] = [
    ("PLT_BRANCH", "Server Branch"),
    ("WEB_BRANCH", "Webapp Branch"),
    ("RN_BRANCH", "Mobile Branch"),
];

fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Validation(message.to_string())),
    }
}

fn in_channel(title: &str, text: String) -> SlashResponse {
    SlashResponse::enriched(title, text, INFO_COLOR, ResponseType::InChannel)
}

/// Parse `KEY=VALUE` words into job parameters
fn job_parameters(words: &[String]) -> Result<JobParameters, AppError> {
    words
        .iter()
        .map(|word| match word.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(AppError::Validation(format!(
                "Bad job parameter \"{}\". Expected KEY=VALUE.",
                word
            ))),
        })
        .collect()
}

/// Render the `KEY="value"` lines of the translation check artifact
fn render_translation_branches(artifact: &str) -> String {
    let mut message = String::from("Translation Server is locked to these branches:\n");

    for line in artifact.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let label = line.split_once('=').and_then(|(key, value)| {
            TRANSLATION_BRANCHES
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, label)| (*label, value.trim_matches('"')))
        });

        match label {
            Some((label, branch)) => message.push_str(&format!("* {}: **{}**\n", label, branch)),
            None => message.push_str(&format!("{}\n", line)),
        }
    }

    message
}

/// Red in-channel report for a translation job that failed or could not be run
fn translation_failure(detail: impl fmt::Display) -> SlashResponse {
    SlashResponse::enriched(
        TRANSLATION_TITLE,
        format!(
            "Translation Job Fail. Please Check the Jenkins Logs. Jenkins Status: {}",
            detail
        ),
        ERROR_COLOR,
        ResponseType::InChannel,
    )
}

impl Dispatcher {
    pub(super) async fn execute(&self, action: Action) -> Result<SlashResponse, AppError> {
        match action {
            Action::CutRelease {
                version,
                backport,
                dryrun,
            } => self.cut_release(version, backport, dryrun).await,
            Action::DumpJobConfig { job } => self.dump_job_config(job).await,
            Action::SetCiBranch { branch } => self.set_ci_branch(branch).await,
            Action::RunJob { job, parameters } => self.run_job(job, parameters).await,
            Action::SetPreReleaseTarget { target } => self.set_pre_release_target(target).await,
            Action::CheckReleaseStatus => self.check_release_status().await,
            Action::LockTranslationBranches { plt, web, mobile } => {
                self.lock_translation_branches(plt, web, mobile).await
            }
            Action::CheckTranslationBranches => self.check_translation_branches().await,
            Action::MergeReleaseBranch { release } => self.merge_release_branch(release).await,
            Action::RunLoadtest {
                build_tag,
                length,
                delay,
            } => self.run_loadtest(build_tag, length, delay).await,
        }
    }

    async fn cut_release(
        &self,
        version: Option<String>,
        backport: bool,
        dry_run: bool,
    ) -> Result<SlashResponse, AppError> {
        let version = version.unwrap_or_default();
        let ReleaseTicket {
            workflow,
            descriptor,
            continuation,
        } = self.release.cut(&version, backport, dry_run).await?;

        // detached: the slash command is answered before the release job runs
        drop(continuation);
        info!(workflow = %workflow, version = %descriptor.full_version(), "Release acknowledged");

        Ok(in_channel(
            "Cut Release",
            format!("Release **{}** is on the way.", descriptor.full_version()),
        ))
    }

    async fn dump_job_config(&self, job: Option<String>) -> Result<SlashResponse, AppError> {
        let job = required(job, "You need to specify a job.")?;
        let config = self.runner.job_config(&job).await?;

        info!(job = %job, "Dumped job config");
        Ok(SlashResponse::text(config, ResponseType::InChannel))
    }

    async fn set_ci_branch(&self, branch: Option<String>) -> Result<SlashResponse, AppError> {
        let branch = required(branch, "You need to specify a branch.")?;
        self.editor
            .set_ci_server_branch(&self.config.ci_server_jobs, &branch)
            .await?;

        Ok(in_channel(
            "CI Servers",
            format!("CI servers now pointed at **{}**", branch),
        ))
    }

    async fn run_job(&self, job: Option<String>, parameters: Vec<String>) -> Result<SlashResponse, AppError> {
        let job = required(job, "You need to specify a job.")?;
        let parameters = job_parameters(&parameters)?;
        self.poller.trigger(&job, &parameters).await?;

        Ok(in_channel("Jenkins Job", format!("Ran job **{}**", job)))
    }

    async fn set_pre_release_target(&self, target: Option<String>) -> Result<SlashResponse, AppError> {
        let target = required(target, "You need to specify a target.")?;
        self.editor
            .set_pre_release_target(&self.config.jobs.pre_release, &target)
            .await?;

        Ok(in_channel(
            "Pre-Release",
            format!("Set pre-release to **{}**", target),
        ))
    }

    async fn check_release_status(&self) -> Result<SlashResponse, AppError> {
        let job = &self.config.jobs.release;
        let summary = self.runner.latest_result(job).await?;

        Ok(SlashResponse::enriched(
            "Status of Jenkins Job",
            format!(
                "Status of *{}*: **{}** Duration: **{}**",
                job,
                summary.status,
                summary.duration_display()
            ),
            summary.color(),
            ResponseType::InChannel,
        ))
    }

    async fn lock_translation_branches(
        &self,
        plt: Option<String>,
        web: Option<String>,
        mobile: Option<String>,
    ) -> Result<SlashResponse, AppError> {
        let branches = [plt, web, mobile].map(Option::unwrap_or_default);

        if branches.iter().all(|branch| branch.is_empty()) {
            return Ok(SlashResponse::enriched(
                TRANSLATION_TITLE,
                "You need to set at least one branch to lock. Please check the help.",
                ERROR_COLOR,
                ResponseType::InChannel,
            ));
        }

        let parameters: JobParameters = TRANSLATION_BRANCHES
            .iter()
            .zip(&branches)
            .map(|((name, _), branch)| (name.to_string(), branch.clone()))
            .collect();

        let job = &self.config.jobs.translation_server;
        match self.poller.run_and_wait(job, &parameters).await {
            Ok(status) if status.is_success() => {}
            Ok(status) => return Ok(translation_failure(status)),
            Err(e) => {
                warn!(job = %job, "Translation lock job failed: {}", e.render());
                return Ok(translation_failure(e.render()));
            }
        }

        let mut message = String::from("Translation Server is locked to these branches:\n");
        for ((_, label), branch) in TRANSLATION_BRANCHES.iter().zip(&branches) {
            if !branch.is_empty() {
                message.push_str(&format!("* {}: **{}**\n", label, branch));
            }
        }

        Ok(in_channel(TRANSLATION_TITLE, message))
    }

    async fn check_translation_branches(&self) -> Result<SlashResponse, AppError> {
        let job = &self.config.jobs.check_translation_server;

        match self.poller.run_and_wait(job, &JobParameters::new()).await {
            Ok(status) if status.is_success() => {}
            Ok(status) => return Ok(translation_failure(status)),
            Err(e) => {
                warn!(job = %job, "Translation check job failed: {}", e.render());
                return Ok(translation_failure(e.render()));
            }
        }

        let artifact = self.runner.latest_artifact(job).await?;
        Ok(in_channel(
            TRANSLATION_TITLE,
            render_translation_branches(&artifact),
        ))
    }

    async fn merge_release_branch(&self, release: Option<String>) -> Result<SlashResponse, AppError> {
        let branch = required(release, "You need to specify a release branch with --release.")?;
        let parameters = JobParameters::from([("RELEASE_BRANCH".to_string(), branch.clone())]);

        let status = self
            .poller
            .run_and_wait(&self.config.jobs.merge_release, &parameters)
            .await?;

        Ok(SlashResponse::enriched(
            format!("Merge Release Branch {} to Master", branch),
            format!("Merge job finished with **{}**", status),
            status.color(),
            ResponseType::InChannel,
        ))
    }

    async fn run_loadtest(&self, build_tag: Option<String>, length: u32, delay: u32) -> Result<SlashResponse, AppError> {
        let build_tag = required(build_tag, "You need to specify a build tag. A branch or pr-0000.")?;

        let parameters = JobParameters::from([
            ("BUILD_TAG".to_string(), build_tag.clone()),
            ("KUBE_BRANCH".to_string(), "master".to_string()),
            ("KUBE_CONFIG_FILE".to_string(), "values_loadtest.yaml".to_string()),
            ("TEST_LENGTH_MINUTES".to_string(), length.to_string()),
            ("PPROF_DELAY".to_string(), delay.to_string()),
        ]);
        self.poller.trigger(&self.config.jobs.kube_deploy, &parameters).await?;

        Ok(SlashResponse::text(
            format!("Loadtesting: {}", build_tag),
            ResponseType::InChannel,
        ))
    }
}
