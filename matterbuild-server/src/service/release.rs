//! Release cut workflow
//!
//! Validation, the backport guard and the pre-checks run while the caller
//! waits. Everything after that runs in a spawned continuation so the slash
//! command can be acknowledged within the chat server's response deadline.
//! The continuation never reports back to the caller; its progress goes to
//! the event sink.

use matterbuild_core::domain::build::JobParameters;
use matterbuild_core::domain::release::ReleaseDescriptor;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::events::{EventSender, ReleaseEvent, ReleaseStep};
use crate::scheduler::Poller;
use crate::service::ci_config::CiConfigEditor;
use crate::service::probe::ReleaseProbe;

const PRE_CHECKS_FAILED: &str = "Pre-checks failed! (Did you update the database upgrade code?)";

/// An acknowledged release whose remaining steps run in the background
#[derive(Debug)]
pub struct ReleaseTicket {
    pub workflow: Uuid,
    pub descriptor: ReleaseDescriptor,
    /// Detached by dropping; tests await it
    pub continuation: JoinHandle<()>,
}

#[derive(Clone)]
pub struct ReleaseOrchestrator {
    config: Arc<Config>,
    poller: Poller,
    editor: CiConfigEditor,
    probe: Arc<dyn ReleaseProbe>,
    events: EventSender,
}

impl ReleaseOrchestrator {
    pub fn new(
        config: Arc<Config>,
        poller: Poller,
        editor: CiConfigEditor,
        probe: Arc<dyn ReleaseProbe>,
        events: EventSender,
    ) -> Self {
        Self {
            config,
            poller,
            editor,
            probe,
            events,
        }
    }

    /// Cut a release
    ///
    /// Returns once the pre-checks passed and the rest of the workflow has
    /// been spawned.
    pub async fn cut(&self, version: &str, backport: bool, dry_run: bool) -> Result<ReleaseTicket, AppError> {
        let descriptor = ReleaseDescriptor::parse(version, backport, dry_run)?;

        self.check_not_backport(&descriptor).await?;
        self.run_pre_checks().await?;

        let workflow = Uuid::new_v4();
        self.emit(ReleaseEvent::Started {
            workflow,
            version: descriptor.full_version(),
        });

        info!(
            workflow = %workflow,
            version = %descriptor.full_version(),
            backport,
            dry_run,
            "Pre-checks passed, continuing release in the background"
        );

        let continuation = tokio::spawn(self.clone().continue_release(workflow, descriptor.clone()));

        Ok(ReleaseTicket {
            workflow,
            descriptor,
            continuation,
        })
    }

    /// Refuse a cut when a newer release line already exists
    async fn check_not_backport(&self, descriptor: &ReleaseDescriptor) -> Result<(), AppError> {
        if descriptor.backport {
            return Ok(());
        }

        let next = descriptor.version.next_minor();
        if self.probe.future_release_exists(&next).await {
            return Err(AppError::Validation(format!(
                "Are you sure this isn't a backport release? I see a future release on the artifact server. ({})",
                next
            )));
        }

        Ok(())
    }

    async fn run_pre_checks(&self) -> Result<(), AppError> {
        let status = self
            .poller
            .run_and_wait(&self.config.jobs.pre_checks, &JobParameters::new())
            .await?;

        if !status.is_success() {
            return Err(AppError::JobFailed {
                message: PRE_CHECKS_FAILED.to_string(),
                status,
            });
        }

        Ok(())
    }

    fn release_parameters(descriptor: &ReleaseDescriptor) -> JobParameters {
        JobParameters::from([
            ("MM_VERSION".to_string(), descriptor.release_part().to_string()),
            ("MM_RC".to_string(), descriptor.rc_suffix()),
            (
                "IS_FIRST_MINOR_RELEASE".to_string(),
                descriptor.is_first_minor_release().to_string(),
            ),
        ])
    }

    async fn continue_release(self, workflow: Uuid, descriptor: ReleaseDescriptor) {
        let parameters = Self::release_parameters(&descriptor);

        match self
            .poller
            .run_and_wait(&self.config.jobs.release, &parameters)
            .await
        {
            Ok(status) if status.is_success() => {
                self.emit(ReleaseEvent::ReleaseJobFinished { workflow, status });
            }
            Ok(status) => {
                self.emit(ReleaseEvent::Abandoned {
                    workflow,
                    reason: format!("release job finished with {}", status),
                });
                return;
            }
            Err(e) => {
                self.emit(ReleaseEvent::Abandoned {
                    workflow,
                    reason: e.render(),
                });
                return;
            }
        }

        if descriptor.updates_pointers() {
            self.update_pointers(workflow, &descriptor).await;
        }

        self.emit(ReleaseEvent::Finished { workflow });
    }

    /// Post-release steps; failures are reported and the next step still runs
    async fn update_pointers(&self, workflow: Uuid, descriptor: &ReleaseDescriptor) {
        let full_version = descriptor.full_version();
        let jobs = &self.config.jobs;

        let result = self
            .editor
            .set_ci_server_branch(&self.config.ci_server_jobs, &descriptor.version.release_branch())
            .await
            .map_err(AppError::from);
        self.record(workflow, ReleaseStep::CiBranch, result);

        let deploy_parameters = JobParameters::from([("MM_VERSION".to_string(), full_version.clone())]);
        let result = self
            .poller
            .trigger(&jobs.release_deploy, &deploy_parameters)
            .await
            .map(drop);
        self.record(workflow, ReleaseStep::ReleaseDeploy, result);

        let result = self
            .editor
            .set_pre_release_target(&jobs.pre_release, &full_version)
            .await
            .map_err(AppError::from);

        if self.record(workflow, ReleaseStep::PreReleaseTarget, result) {
            let result = self
                .poller
                .trigger(&jobs.pre_release, &JobParameters::new())
                .await
                .map(drop);
            self.record(workflow, ReleaseStep::PreRelease, result);
        } else {
            self.emit(ReleaseEvent::StepSkipped {
                workflow,
                step: ReleaseStep::PreRelease,
            });
        }
    }

    fn record(&self, workflow: Uuid, step: ReleaseStep, result: Result<(), AppError>) -> bool {
        match result {
            Ok(()) => {
                self.emit(ReleaseEvent::StepCompleted { workflow, step });
                true
            }
            Err(e) => {
                self.emit(ReleaseEvent::StepFailed {
                    workflow,
                    step,
                    error: e.render(),
                });
                false
            }
        }
    }

    fn emit(&self, event: ReleaseEvent) {
        // a closed sink must not stop the workflow
        let _ = self.events.send(event);
    }
}
