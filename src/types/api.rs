//! Request and response bodies exchanged with the chat backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::{Message, Sender, Source};
use crate::utils::time::deserialize_lenient;

/// Response of `POST /api/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionCreated {
    /// The newly created session identifier.
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Response of `GET /api/sessions/{id}/history`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HistoryResponse {
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// One stored turn of a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    /// Backend identifier; may be a string, a number, or missing.
    #[serde(default)]
    pub id: Option<Value>,

    /// Text of the turn.
    pub content: String,

    /// Author of the turn.
    #[serde(rename = "type")]
    pub r#type: Sender,

    /// When the turn happened.
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub timestamp: Option<OffsetDateTime>,

    /// Cited sources, for bot turns.
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

impl HistoryEntry {
    /// Convert into a finalized transcript message.  `fallback_id` is used when the backend
    /// did not supply an identifier.
    pub fn into_message(self, fallback_id: String) -> Message {
        let id = match self.id {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => fallback_id,
        };
        let message = match self.r#type {
            Sender::User => Message::user(id, self.content),
            Sender::Bot => Message::bot(id, self.content, self.sources.unwrap_or_default()),
        };
        match self.timestamp {
            Some(timestamp) => message.with_timestamp(timestamp),
            None => message,
        }
    }
}

/// Body of `POST /api/chat/{sessionId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// The raw message text.
    pub message: String,
}

/// Response of `POST /api/chat/{sessionId}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// The complete answer text.
    pub response: String,

    /// Sources backing the answer.
    #[serde(default)]
    pub sources: Option<Vec<Source>>,

    /// When the backend produced the answer.
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub timestamp: Option<OffsetDateTime>,
}

impl ChatResponse {
    /// A response with text and sources, stamped now.
    pub fn new(response: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            response: response.into(),
            sources: Some(sources),
            timestamp: Some(OffsetDateTime::now_utc()),
        }
    }
}
