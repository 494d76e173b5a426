//! Command dispatcher
//!
//! Authorizes a slash command, parses its text into an
//! [`Action`](crate::service::command::Action) and runs
//! the matching handler. Every outcome, failures included, becomes a
//! [`SlashResponse`]; nothing here produces a transport-level error.

use matterbuild_client::runner::JobRunner;
use matterbuild_core::domain::command::SlashCommand;
use matterbuild_core::dto::slash::{INFO_COLOR, ResponseType, SlashResponse};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::events::EventSender;
use crate::scheduler::{PollPolicy, Poller, ShutdownSignal};
use crate::service::auth::AuthorizationGate;
use crate::service::ci_config::{CiConfigEditor, UpstreamNaming};
use crate::service::command::{ParseFailure, parse_action};
use crate::service::probe::ReleaseProbe;
use crate::service::release::ReleaseOrchestrator;

pub struct Dispatcher {
    pub(super) config: Arc<Config>,
    pub(super) runner: Arc<dyn JobRunner>,
    pub(super) poller: Poller,
    pub(super) editor: CiConfigEditor,
    pub(super) release: ReleaseOrchestrator,
    gate: AuthorizationGate,
}

impl Dispatcher {
    pub fn new(
        config: Arc<Config>,
        runner: Arc<dyn JobRunner>,
        probe: Arc<dyn ReleaseProbe>,
        policy: PollPolicy,
        events: EventSender,
        shutdown: ShutdownSignal,
    ) -> Self {
        let poller = Poller::new(runner.clone(), policy, shutdown);
        let editor = CiConfigEditor::new(runner.clone(), UpstreamNaming::new(&config.upstream));
        let release = ReleaseOrchestrator::new(
            config.clone(),
            poller.clone(),
            editor.clone(),
            probe,
            events,
        );

        Self {
            gate: AuthorizationGate::new(&config),
            config,
            runner,
            poller,
            editor,
            release,
        }
    }

    /// Authorize, parse and run one slash command
    pub async fn handle(&self, command: &SlashCommand) -> SlashResponse {
        if let Err(e) = self.gate.check_caller(command) {
            warn!(
                user_id = %command.user_id,
                username = %command.username,
                "Rejected slash command: {}",
                e
            );
            return SlashResponse::error(AppError::from(e).render());
        }

        let action = match parse_action(&command.text) {
            Ok(action) => action,
            Err(ParseFailure::Usage(usage)) => {
                return SlashResponse::enriched("Information", usage, INFO_COLOR, ResponseType::Ephemeral);
            }
            Err(ParseFailure::Malformed(message)) => return SlashResponse::error(message),
        };

        if action.is_release_cut() {
            if let Err(e) = self.gate.check_release_user(command) {
                warn!(
                    user_id = %command.user_id,
                    username = %command.username,
                    "Rejected release cut: {}",
                    e
                );
                return SlashResponse::error(AppError::from(e).render());
            }
        }

        let name = action.name();
        info!(
            username = %command.username,
            channel = %command.channel_name,
            action = name,
            "Dispatching slash command"
        );

        match self.execute(action).await {
            Ok(response) => response,
            Err(e) => {
                let message = e.render();
                if e.is_validation() {
                    info!(action = name, "Slash command refused: {}", message);
                } else {
                    warn!(action = name, "Slash command failed: {}", message);
                }
                SlashResponse::error(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use crate::testing::{
        DEVELOPER, FakeProbe, FakeRunner, RELEASE_USER, immediate_policy, slash_command, test_config,
    };

    fn dispatcher(runner: FakeRunner) -> (Dispatcher, Arc<FakeRunner>) {
        let runner = Arc::new(runner);
        let (sender, _receiver) = events::channel();
        let dispatcher = Dispatcher::new(
            Arc::new(test_config()),
            runner.clone(),
            Arc::new(FakeProbe::new(false)),
            immediate_policy(),
            sender,
            ShutdownSignal::never(),
        );
        (dispatcher, runner)
    }

    #[tokio::test]
    async fn test_bad_token_rejected_for_every_command() {
        for text in ["cut-release 5.3.0", "run-job deploy", "cutstatus", "nonsense"] {
            let (dispatcher, runner) = dispatcher(FakeRunner::new());
            let mut command = slash_command(RELEASE_USER, text);
            command.token = "wrong".to_string();

            let response = dispatcher.handle(&command).await;

            assert!(response.is_ephemeral());
            assert_eq!(response.text, "Token for slash command is incorrect");
            assert_eq!(runner.remote_calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let (dispatcher, _) = dispatcher(FakeRunner::new());
        let response = dispatcher.handle(&slash_command("intruder", "run-job deploy")).await;

        assert!(response.is_ephemeral());
        assert_eq!(response.text, "You don't have permissions to use this command.");
    }

    #[tokio::test]
    async fn test_release_user_required_only_for_cut() {
        let (dispatcher, runner) = dispatcher(FakeRunner::new());

        let response = dispatcher
            .handle(&slash_command(DEVELOPER, "cut-release 5.3.0-rc1"))
            .await;
        assert!(response.is_ephemeral());
        assert_eq!(response.text, "You don't have permissions to cut a release.");
        assert_eq!(runner.remote_calls(), 0);

        let response = dispatcher.handle(&slash_command(DEVELOPER, "run-job deploy")).await;
        assert!(!response.is_ephemeral());
        assert_eq!(runner.invoked_jobs(), vec!["deploy"]);
    }

    #[tokio::test]
    async fn test_unknown_command_is_informational() {
        let (dispatcher, _) = dispatcher(FakeRunner::new());
        let response = dispatcher.handle(&slash_command(DEVELOPER, "explode")).await;

        assert!(response.is_ephemeral());
        assert_eq!(response.attachments[0].title, "Information");
        assert_eq!(response.attachments[0].color, INFO_COLOR);
    }

    #[tokio::test]
    async fn test_handler_errors_render_with_cause() {
        let (dispatcher, _) = dispatcher(FakeRunner::new().with_missing_job("ghost"));
        let response = dispatcher.handle(&slash_command(DEVELOPER, "run-job ghost")).await;

        assert!(response.is_ephemeral());
        assert_eq!(response.text, "Unable to invoke job ghost |:| Unable to get job ghost");
    }

    #[tokio::test]
    async fn test_unclosed_quote_is_an_error() {
        let (dispatcher, _) = dispatcher(FakeRunner::new());
        let response = dispatcher
            .handle(&slash_command(DEVELOPER, "run-job \"deploy"))
            .await;

        assert!(response.is_ephemeral());
        assert!(response.attachments.is_empty());
        assert!(response.text.starts_with("Unable to parse command"));
    }
}
