//! The ordered list of visible messages.

use crate::types::Message;

/// Append-only message list with at most one streaming message, always at the tail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// An empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// The messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if there are no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The newest message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Replace every message.  Streaming flags on the incoming messages are cleared except on
    /// the last one.
    pub fn replace(&mut self, mut messages: Vec<Message>) {
        let len = messages.len();
        for message in messages.iter_mut().take(len.saturating_sub(1)) {
            message.is_streaming = false;
        }
        self.messages = messages;
    }

    /// Append a message.
    ///
    /// A streaming tail must be finalized or discarded before anything else is appended.
    pub fn push(&mut self, message: Message) {
        debug_assert!(
            !self.has_streaming_tail(),
            "appending behind an in-progress message"
        );
        if let Some(tail) = self.messages.last_mut() {
            tail.is_streaming = false;
        }
        self.messages.push(message);
    }

    /// True if the newest message is still streaming.
    pub fn has_streaming_tail(&self) -> bool {
        self.messages.last().is_some_and(|m| m.is_streaming)
    }

    /// The streaming tail, if any.
    pub fn streaming_tail_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut().filter(|m| m.is_streaming)
    }

    /// Remove and return the streaming tail, if any.
    pub fn discard_streaming_tail(&mut self) -> Option<Message> {
        if self.has_streaming_tail() {
            self.messages.pop()
        } else {
            None
        }
    }

    /// Number of messages flagged as streaming.  Never more than one.
    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_streaming).count()
    }
}
