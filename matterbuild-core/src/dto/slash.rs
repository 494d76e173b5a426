//! Slash command response payload

use serde::{Deserialize, Serialize};

/// Default attachment color for informational responses
pub const INFO_COLOR: &str = "#0060aa";

/// Attachment color for failures reported in the channel
pub const ERROR_COLOR: &str = "#ee2116";

/// Who gets to see a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Visible to everyone in the channel
    InChannel,
    /// Visible only to the caller
    Ephemeral,
}

/// A titled, colored block of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub title: String,
    pub text: String,
    pub color: String,
}

/// Body of every slash command response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashResponse {
    pub response_type: ResponseType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl SlashResponse {
    /// Plain text response
    pub fn text(text: impl Into<String>, response_type: ResponseType) -> Self {
        Self {
            response_type,
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Response carrying a single attachment
    pub fn enriched(
        title: impl Into<String>,
        text: impl Into<String>,
        color: impl Into<String>,
        response_type: ResponseType,
    ) -> Self {
        Self {
            response_type,
            text: String::new(),
            attachments: vec![Attachment {
                title: title.into(),
                text: text.into(),
                color: color.into(),
            }],
        }
    }

    /// Private error feedback for the caller
    pub fn error(message: impl Into<String>) -> Self {
        Self::text(message, ResponseType::Ephemeral)
    }

    pub fn is_ephemeral(&self) -> bool {
        self.response_type == ResponseType::Ephemeral
    }
}
