//! Release workflow events
//!
//! The background half of a release cut has nobody to answer to, so it
//! reports progress over a channel to a sink task that logs it.

use matterbuild_core::domain::build::BuildStatus;
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type EventSender = mpsc::UnboundedSender<ReleaseEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ReleaseEvent>;

/// Post-release steps that run once the release job succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    CiBranch,
    ReleaseDeploy,
    PreReleaseTarget,
    PreRelease,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseStep::CiBranch => "set CI branch",
            ReleaseStep::ReleaseDeploy => "release deploy",
            ReleaseStep::PreReleaseTarget => "set pre-release target",
            ReleaseStep::PreRelease => "pre-release",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseEvent {
    Started { workflow: Uuid, version: String },
    ReleaseJobFinished { workflow: Uuid, status: BuildStatus },
    /// The release job failed; no further automation runs
    Abandoned { workflow: Uuid, reason: String },
    StepCompleted { workflow: Uuid, step: ReleaseStep },
    StepFailed { workflow: Uuid, step: ReleaseStep, error: String },
    StepSkipped { workflow: Uuid, step: ReleaseStep },
    Finished { workflow: Uuid },
}

impl ReleaseEvent {
    pub fn workflow(&self) -> Uuid {
        match self {
            ReleaseEvent::Started { workflow, .. }
            | ReleaseEvent::ReleaseJobFinished { workflow, .. }
            | ReleaseEvent::Abandoned { workflow, .. }
            | ReleaseEvent::StepCompleted { workflow, .. }
            | ReleaseEvent::StepFailed { workflow, .. }
            | ReleaseEvent::StepSkipped { workflow, .. }
            | ReleaseEvent::Finished { workflow } => *workflow,
        }
    }
}

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

fn log_event(event: &ReleaseEvent) {
    let workflow = event.workflow();
    match event {
        ReleaseEvent::Started { version, .. } => {
            info!(workflow = %workflow, version = %version, "Release workflow started")
        }
        ReleaseEvent::ReleaseJobFinished { status, .. } => {
            info!(workflow = %workflow, status = %status, "Release job finished")
        }
        ReleaseEvent::Abandoned { reason, .. } => {
            warn!(workflow = %workflow, "Release workflow stopped: {}", reason)
        }
        ReleaseEvent::StepCompleted { step, .. } => {
            info!(workflow = %workflow, step = %step, "Release step completed")
        }
        ReleaseEvent::StepFailed { step, error, .. } => {
            warn!(workflow = %workflow, step = %step, "Release step failed: {}", error)
        }
        ReleaseEvent::StepSkipped { step, .. } => {
            info!(workflow = %workflow, step = %step, "Release step skipped")
        }
        ReleaseEvent::Finished { .. } => info!(workflow = %workflow, "Release workflow finished"),
    }
}

/// Log every event until all senders are dropped
pub fn spawn_sink(mut receiver: EventReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            log_event(&event);
        }
        debug!("Release event sink closed");
    })
}
