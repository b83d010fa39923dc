use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Source;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the widget.
    User,
    /// The backend.
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// One entry of the visible transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier, unique within the transcript.
    pub id: String,

    /// Message body.  For a streaming message this grows as the reveal proceeds.
    pub text: String,

    /// Author of the message.
    pub sender: Sender,

    /// When the message was created or received.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,

    /// Sources cited by a finalized bot message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,

    /// True while the text is still being revealed.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_streaming: bool,

    /// True for locally synthesized error messages.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,

    /// True for the locally synthesized greeting.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_welcome: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Message {
    fn new(id: impl Into<String>, text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sender,
            timestamp: OffsetDateTime::now_utc(),
            sources: Vec::new(),
            is_streaming: false,
            is_error: false,
            is_welcome: false,
        }
    }

    /// A message typed by the user.
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text, Sender::User)
    }

    /// A finalized bot message.
    pub fn bot(id: impl Into<String>, text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            sources,
            ..Self::new(id, text, Sender::Bot)
        }
    }

    /// An empty bot message that is still streaming.
    pub fn streaming(id: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            is_streaming: true,
            ..Self::bot(id, "", sources)
        }
    }

    /// A bot-side error notice.
    pub fn error(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(id, text, Sender::Bot)
        }
    }

    /// The greeting shown when a session has no history.
    pub fn welcome(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            is_welcome: true,
            ..Self::new(id, text, Sender::Bot)
        }
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The sources to display, truncated to `max`.
    pub fn displayed_sources(&self, max: usize) -> &[Source] {
        &self.sources[..self.sources.len().min(max)]
    }
}
