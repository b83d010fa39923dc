//! Sending a user message and turning the outcome into transcript updates.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client::ChatBackend;
use crate::error::Result;
use crate::observability::{DISPATCH_DURATION, DISPATCH_ERRORS, DISPATCH_TIMEOUTS, DISPATCHES};
use crate::types::{ChatResponse, Message};

use super::controller::{Event, Widget};
use super::render::Renderer;
use super::task::{TaskGuard, bounded};

/// Reply shown when a chat request exceeds its deadline.
pub const TIMEOUT_REPLY: &str =
    "The request timed out. The server may be busy, please try again in a moment.";

/// Reply shown when a chat request fails for any other reason.
pub const FAILURE_REPLY: &str =
    "Sorry, I couldn't get a response from the server. Please try again.";

/// What became of a call to [`Widget::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The message was appended and the request is in flight.
    Sent,
    /// Nothing happened.
    Ignored(Ignored),
}

/// Why a send was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// The text was empty or only whitespace.
    Blank,
    /// A request or reveal is still running.
    Busy,
    /// There is no session.
    NoSession,
    /// The backend is not reachable.
    Disconnected,
    /// The widget has been torn down.
    TornDown,
}

/// An in-flight chat request.
#[derive(Debug)]
pub(crate) struct InFlight {
    pub(crate) id: u64,
    started: Instant,
    task: TaskGuard,
}

impl InFlight {
    pub(crate) fn abort(&mut self) {
        self.task.cancel();
    }
}

/// Truncate `text` to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl<B: ChatBackend> Widget<B> {
    /// Send `text` as a user message.
    ///
    /// A no-op when the text is blank, a send or reveal is in progress, there is no session, or
    /// the backend is unreachable.  Otherwise the user message and a streaming placeholder are
    /// appended right away, the input buffer is cleared, and the request runs in the
    /// background; its outcome arrives as an event.
    pub fn send(&mut self, text: &str, renderer: &mut dyn Renderer) -> Dispatch {
        // Truncated first: a zero length limit must read as blank input.
        let text = truncate_chars(text.trim(), self.config.max_message_length).trim_end();
        let blocked = if self.is_torn_down() {
            Some(Ignored::TornDown)
        } else if text.is_empty() {
            Some(Ignored::Blank)
        } else if self.is_busy() {
            Some(Ignored::Busy)
        } else if self.state.session_id.is_none() {
            Some(Ignored::NoSession)
        } else if !self.state.connected {
            Some(Ignored::Disconnected)
        } else {
            None
        };
        if let Some(reason) = blocked {
            tracing::debug!(?reason, "send ignored");
            return Dispatch::Ignored(reason);
        }
        let Some(session_id) = self.state.session_id.clone() else {
            return Dispatch::Ignored(Ignored::NoSession);
        };
        let text = text.to_string();

        let max_sources = self.config.max_sources;
        let user = Message::user(self.next_message_id(), text.clone());
        renderer.print_message(&user, max_sources);
        self.state.transcript.push(user);
        let placeholder = Message::streaming(self.next_message_id(), Vec::new());
        self.state.transcript.push(placeholder);
        renderer.start_response();
        self.state.input.clear();

        DISPATCHES.click();
        let id = self.next_generation();
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let timeout = self.config.chat_timeout;
        let task = TaskGuard::spawn(move |token| async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = bounded(timeout, "chat request", backend.chat(&session_id, &text)) => outcome,
            };
            let _ = events.send(Event::ChatCompleted {
                dispatch: id,
                outcome,
            });
        });
        self.in_flight = Some(InFlight {
            id,
            started: Instant::now(),
            task,
        });
        Dispatch::Sent
    }

    /// Send whatever is in the input buffer.
    pub fn submit(&mut self, renderer: &mut dyn Renderer) -> Dispatch {
        let text = self.state.input.clone();
        self.send(&text, renderer)
    }

    pub(crate) fn chat_completed(
        &mut self,
        dispatch: u64,
        outcome: Result<ChatResponse>,
        renderer: &mut dyn Renderer,
    ) {
        let Some(in_flight) = self.in_flight.take_if(|f| f.id == dispatch) else {
            tracing::debug!(dispatch, "stale chat response dropped");
            return;
        };
        let elapsed: Duration = in_flight.started.elapsed();
        DISPATCH_DURATION.add(elapsed.as_secs_f64());
        self.state.transcript.discard_streaming_tail();
        renderer.discard_response();

        match outcome {
            Ok(response) => {
                tracing::debug!(?elapsed, chars = response.response.len(), "chat response received");
                self.set_connected(true, renderer);
                self.reveal(
                    &response.response,
                    response.sources.unwrap_or_default(),
                    renderer,
                );
            }
            Err(err) => {
                DISPATCH_ERRORS.click();
                let reply = if err.is_timeout() {
                    DISPATCH_TIMEOUTS.click();
                    TIMEOUT_REPLY
                } else {
                    FAILURE_REPLY
                };
                tracing::warn!("chat request failed: {}", err);
                self.set_connected(false, renderer);
                let message = Message::error(self.next_message_id(), reply);
                renderer.print_message(&message, self.config.max_sources);
                self.state.transcript.push(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("日本語", 2), "日本");
        assert_eq!(truncate_chars("", 0), "");
    }
}
