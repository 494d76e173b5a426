//! Slash command domain types

use serde::{Deserialize, Serialize};

/// An inbound slash command as posted by the chat server
///
/// Field names follow the chat server's URL-encoded form. Unknown form
/// fields are ignored and absent ones default to empty strings so that the
/// authorization gate, not the decoder, decides what an incomplete request
/// is allowed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlashCommand {
    pub channel_id: String,
    pub channel_name: String,
    /// The trigger word, e.g. `/matterbuild`
    pub command: String,
    #[serde(rename = "team_domain")]
    pub team_name: String,
    pub team_id: String,
    /// Free text following the trigger word
    pub text: String,
    pub token: String,
    pub user_id: String,
    #[serde(rename = "user_name")]
    pub username: String,
}
