//! Slash command endpoint

use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
};
use matterbuild_core::domain::command::SlashCommand;
use matterbuild_core::dto::slash::SlashResponse;
use std::sync::Arc;

use crate::service::Dispatcher;

/// POST /slash_command
///
/// Always answers 200; failures travel in the response payload.
pub async fn slash_command(
    State(dispatcher): State<Arc<Dispatcher>>,
    form: Result<Form<SlashCommand>, FormRejection>,
) -> Json<SlashResponse> {
    let command = match form {
        Ok(Form(command)) => command,
        Err(rejection) => {
            tracing::warn!("Unable to parse incoming slash command: {}", rejection.body_text());
            return Json(SlashResponse::error(
                "Unable to parse incoming slash command info",
            ));
        }
    };

    Json(dispatcher.handle(&command).await)
}
