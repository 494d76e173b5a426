//! Job configuration editing
//!
//! CI servers are repointed by rewriting two elements of each job's XML
//! configuration: the default value of the branch parameter and the upstream
//! project whose builds trigger the job. The pre-release target lives in the
//! same default-value element of the pre-release job.

use matterbuild_client::error::JobRunnerError;
use matterbuild_client::runner::JobRunner;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::config::UpstreamConfig;

const DEFAULT_VALUE_PATH: &[&str] = &[
    "properties",
    "hudson.model.ParametersDefinitionProperty",
    "parameterDefinitions",
    "hudson.model.StringParameterDefinition",
    "defaultValue",
];

const UPSTREAM_PROJECTS_PATH: &[&str] = &[
    "triggers",
    "jenkins.triggers.ReverseBuildTrigger",
    "upstreamProjects",
];

#[derive(Debug, Error)]
pub enum ConfigUpdateError {
    #[error("Unable to fetch configuration of {job}")]
    Fetch {
        job: String,
        #[source]
        source: JobRunnerError,
    },

    #[error("Unable to read configuration of {job}: {reason}")]
    Read { job: String, reason: String },

    #[error("Unable to find {element} in configuration of {job}")]
    MissingElement { job: String, element: &'static str },

    #[error("Unable to write out final configuration of {job}: {reason}")]
    Write { job: String, reason: String },

    #[error("Unable to save configuration of {job}")]
    Save {
        job: String,
        #[source]
        source: JobRunnerError,
    },
}

/// Maps a branch to the upstream project CI follows for it
#[derive(Debug, Clone)]
pub struct UpstreamNaming {
    enterprise_project: String,
    platform_prefix: String,
}

impl UpstreamNaming {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            enterprise_project: config.enterprise_project.clone(),
            platform_prefix: config.platform_prefix.clone(),
        }
    }

    pub fn upstream_for(&self, branch: &str) -> String {
        if branch == "master" {
            self.enterprise_project.clone()
        } else {
            format!("{}/{}", self.platform_prefix, branch)
        }
    }
}

/// Replace the text of the element at `path`
fn set_text(
    root: &mut Element,
    path: &[&'static str],
    value: &str,
    job: &str,
) -> Result<(), ConfigUpdateError> {
    let element = path
        .iter()
        .try_fold(root, |element, name| element.get_mut_child(*name))
        .ok_or_else(|| ConfigUpdateError::MissingElement {
            job: job.to_string(),
            element: path.last().copied().unwrap_or_default(),
        })?;

    element
        .children
        .retain(|node| !matches!(node, XMLNode::Text(_) | XMLNode::CData(_)));
    element.children.push(XMLNode::Text(value.to_string()));
    Ok(())
}

fn parse(job: &str, xml: &str) -> Result<Element, ConfigUpdateError> {
    Element::parse(xml.as_bytes()).map_err(|e| ConfigUpdateError::Read {
        job: job.to_string(),
        reason: e.to_string(),
    })
}

fn serialize(job: &str, root: &Element) -> Result<String, ConfigUpdateError> {
    let write_error = |reason: String| ConfigUpdateError::Write {
        job: job.to_string(),
        reason,
    };

    let mut out = Vec::new();
    root.write_with_config(&mut out, EmitterConfig::new().perform_indent(true))
        .map_err(|e| write_error(e.to_string()))?;

    String::from_utf8(out).map_err(|e| write_error(e.to_string()))
}

/// Point a CI job configuration at `branch`
pub fn rewrite_ci_config(
    job: &str,
    xml: &str,
    branch: &str,
    naming: &UpstreamNaming,
) -> Result<String, ConfigUpdateError> {
    let mut root = parse(job, xml)?;
    set_text(&mut root, DEFAULT_VALUE_PATH, branch, job)?;
    set_text(&mut root, UPSTREAM_PROJECTS_PATH, &naming.upstream_for(branch), job)?;
    serialize(job, &root)
}

/// Set the default parameter value of a job configuration
pub fn rewrite_default_value(job: &str, xml: &str, value: &str) -> Result<String, ConfigUpdateError> {
    let mut root = parse(job, xml)?;
    set_text(&mut root, DEFAULT_VALUE_PATH, value, job)?;
    serialize(job, &root)
}

/// Fetches, rewrites and saves job configurations
#[derive(Clone)]
pub struct CiConfigEditor {
    runner: Arc<dyn JobRunner>,
    naming: UpstreamNaming,
}

impl CiConfigEditor {
    pub fn new(runner: Arc<dyn JobRunner>, naming: UpstreamNaming) -> Self {
        Self { runner, naming }
    }

    /// Point every CI server job at `branch`, stopping at the first failure
    pub async fn set_ci_server_branch(&self, jobs: &[String], branch: &str) -> Result<(), ConfigUpdateError> {
        for job in jobs {
            let xml = self.fetch(job).await?;
            let updated = rewrite_ci_config(job, &xml, branch, &self.naming)?;
            self.save(job, &updated).await?;
            debug!(job = %job, branch = %branch, "CI server job repointed");
        }

        info!(branch = %branch, jobs = jobs.len(), "CI servers pointed at branch");
        Ok(())
    }

    /// Set the target the pre-release job builds by default
    pub async fn set_pre_release_target(&self, job: &str, target: &str) -> Result<(), ConfigUpdateError> {
        let xml = self.fetch(job).await?;
        let updated = rewrite_default_value(job, &xml, target)?;
        self.save(job, &updated).await?;

        info!(job = %job, target = %target, "Pre-release target set");
        Ok(())
    }

    async fn fetch(&self, job: &str) -> Result<String, ConfigUpdateError> {
        self.runner
            .job_config(job)
            .await
            .map_err(|source| ConfigUpdateError::Fetch {
                job: job.to_string(),
                source,
            })
    }

    async fn save(&self, job: &str, xml: &str) -> Result<(), ConfigUpdateError> {
        self.runner
            .update_job_config(job, xml)
            .await
            .map_err(|source| ConfigUpdateError::Save {
                job: job.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CI_JOB_CONFIG, FakeRunner};

    fn naming() -> UpstreamNaming {
        UpstreamNaming::new(&UpstreamConfig::default())
    }

    fn text_at(xml: &str, path: &[&str]) -> Option<String> {
        let root = Element::parse(xml.as_bytes()).unwrap();
        path.iter()
            .try_fold(&root, |element, name| element.get_child(*name))
            .and_then(|element| element.get_text())
            .map(|text| text.into_owned())
    }

    #[test]
    fn test_upstream_mapping() {
        let naming = naming();
        assert_eq!(naming.upstream_for("master"), "mattermost-enterprise");
        assert_eq!(naming.upstream_for("release-5.3"), "platform-repo/release-5.3");
    }

    #[test]
    fn test_rewrite_ci_config() {
        let xml = rewrite_ci_config("ci-linux", CI_JOB_CONFIG, "release-5.3", &naming()).unwrap();

        assert_eq!(text_at(&xml, DEFAULT_VALUE_PATH).as_deref(), Some("release-5.3"));
        assert_eq!(
            text_at(&xml, UPSTREAM_PROJECTS_PATH).as_deref(),
            Some("platform-repo/release-5.3")
        );
        assert_eq!(text_at(&xml, &["description"]).as_deref(), Some("CI server"));
    }

    #[test]
    fn test_rewrite_back_to_master() {
        let xml = rewrite_ci_config("ci-linux", CI_JOB_CONFIG, "release-5.3", &naming()).unwrap();
        let xml = rewrite_ci_config("ci-linux", &xml, "master", &naming()).unwrap();

        assert_eq!(text_at(&xml, DEFAULT_VALUE_PATH).as_deref(), Some("master"));
        assert_eq!(
            text_at(&xml, UPSTREAM_PROJECTS_PATH).as_deref(),
            Some("mattermost-enterprise")
        );
    }

    #[test]
    fn test_missing_trigger_element() {
        let xml = "<project><properties/></project>";
        let err = rewrite_ci_config("ci-linux", xml, "master", &naming()).unwrap_err();
        assert!(matches!(
            err,
            ConfigUpdateError::MissingElement {
                element: "defaultValue",
                ..
            }
        ));
    }

    #[test]
    fn test_unreadable_config() {
        let err = rewrite_default_value("pre-release", "<project>", "5.3.0").unwrap_err();
        assert!(matches!(err, ConfigUpdateError::Read { .. }));
    }

    #[tokio::test]
    async fn test_editor_updates_every_job() {
        let runner = Arc::new(
            FakeRunner::new()
                .with_config("ci-linux", CI_JOB_CONFIG)
                .with_config("ci-windows", CI_JOB_CONFIG),
        );
        let editor = CiConfigEditor::new(runner.clone(), naming());
        let jobs = vec!["ci-linux".to_string(), "ci-windows".to_string()];

        editor.set_ci_server_branch(&jobs, "release-5.3").await.unwrap();

        let updated = runner.updated_configs();
        assert_eq!(updated.len(), 2);
        for (_, xml) in &updated {
            assert_eq!(text_at(xml, DEFAULT_VALUE_PATH).as_deref(), Some("release-5.3"));
        }
    }

    #[tokio::test]
    async fn test_editor_reports_save_failure() {
        let runner = Arc::new(
            FakeRunner::new()
                .with_config("mattermost-pre-release", CI_JOB_CONFIG)
                .with_rejected_update("mattermost-pre-release"),
        );
        let editor = CiConfigEditor::new(runner.clone(), naming());

        let err = editor
            .set_pre_release_target("mattermost-pre-release", "5.3.0-rc2")
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigUpdateError::Save { .. }));
    }

    #[tokio::test]
    async fn test_editor_reports_missing_job() {
        let runner = Arc::new(FakeRunner::new());
        let editor = CiConfigEditor::new(runner, naming());

        let err = editor
            .set_pre_release_target("mattermost-pre-release", "5.3.0")
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigUpdateError::Fetch { .. }));
    }
}
