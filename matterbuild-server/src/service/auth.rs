//! Authorization gate
//!
//! Checked from scratch on every request: token, then caller, then the
//! stricter release list for the one action that needs it.

use matterbuild_core::domain::command::SlashCommand;
use std::collections::HashSet;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Token for slash command is incorrect")]
    BadToken,

    #[error("You don't have permissions to use this command.")]
    UserNotAllowed,

    #[error("You don't have permissions to cut a release.")]
    ReleaseUserNotAllowed,
}

#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    tokens: HashSet<String>,
    users: HashSet<String>,
    release_users: HashSet<String>,
}

fn non_empty(values: &[String]) -> HashSet<String> {
    values.iter().filter(|v| !v.is_empty()).cloned().collect()
}

impl AuthorizationGate {
    pub fn new(config: &Config) -> Self {
        Self {
            tokens: non_empty(&config.allowed_tokens),
            users: non_empty(&config.allowed_users),
            release_users: non_empty(&config.release_users),
        }
    }

    /// Token and identity checks shared by every command
    pub fn check_caller(&self, command: &SlashCommand) -> Result<(), AuthError> {
        if !self.tokens.contains(&command.token) {
            return Err(AuthError::BadToken);
        }
        if !self.users.contains(&command.user_id) {
            return Err(AuthError::UserNotAllowed);
        }
        Ok(())
    }

    /// Additional check for cutting a release
    pub fn check_release_user(&self, command: &SlashCommand) -> Result<(), AuthError> {
        if self.release_users.contains(&command.user_id) {
            Ok(())
        } else {
            Err(AuthError::ReleaseUserNotAllowed)
        }
    }
}
