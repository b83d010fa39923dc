//! Session bootstrap, history load, and reset.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::client::ChatBackend;
use crate::error::{Error, Result};
use crate::observability::{
    BOOTSTRAP_ATTEMPTS, BOOTSTRAP_FAILURES, BOOTSTRAP_RETRIES, HISTORY_LOAD_FAILURES,
    SESSIONS_CREATED,
};
use crate::storage::SESSION_KEY;
use crate::types::Message;

use super::controller::Widget;
use super::render::Renderer;
use super::state::StatusLine;
use super::task::bounded;

/// Status shown while waiting out a cold start.
pub const WAKING_UP_STATUS: &str =
    "The server is waking up. This can take up to a minute on the first visit...";

/// Status shown after bootstrap gives up.
pub const UNREACHABLE_STATUS: &str = "Unable to connect to the server. Please restart to try again.";

/// Transcript entry shown after bootstrap gives up.
pub const UNREACHABLE_REPLY: &str =
    "I'm having trouble connecting to the server right now. Please try again later.";

/// Reply appended when clearing the conversation fails.
pub const RESET_FAILED_REPLY: &str = "Couldn't clear the conversation. Please try again.";

/// How bootstrap reacts to a health probe that times out.
///
/// Only timeouts are retried; they are what a backend that is still starting up looks like.
/// Every other failure is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Fixed delay before each retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A policy with `max_retries` retries spaced by `backoff`.
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A policy that never retries.
    pub fn never() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// The delay before retrying after attempt number `attempt` (starting at zero) failed with
    /// `err`, or `None` if bootstrap should give up.
    pub fn retry_after(&self, attempt: u32, err: &Error) -> Option<Duration> {
        if err.is_timeout() && attempt < self.max_retries {
            Some(self.backoff)
        } else {
            None
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(5))
    }
}

/// Result of [`Widget::bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A session is active and the monitor is running.
    Ready {
        /// The active session identifier.
        session_id: String,
    },
    /// The backend could not be reached; the cached session was cleared.
    Failed,
}

#[derive(Serialize)]
struct TranscriptFile<'a> {
    version: u8,
    session_id: Option<&'a str>,
    messages: &'a [Message],
}

impl<B: ChatBackend> Widget<B> {
    /// Obtain a session and populate the transcript.
    ///
    /// Probes the backend with a long deadline, retrying per the configured [`RetryPolicy`]
    /// when the probe times out.  Then reuses the stored session or creates one, loads history
    /// (falling back to a welcome message), and starts the connectivity monitor.  Failures are
    /// reported through the transcript and status line; nothing is returned as an error.
    pub async fn bootstrap(&mut self, renderer: &mut dyn Renderer) -> BootstrapOutcome {
        if self.is_torn_down() {
            return BootstrapOutcome::Failed;
        }
        let mut attempt = 0;
        loop {
            BOOTSTRAP_ATTEMPTS.click();
            let probe = bounded(
                self.config.bootstrap_timeout,
                "health probe",
                self.backend.health(),
            )
            .await;
            let Err(err) = probe else {
                break;
            };
            match self.config.retry.retry_after(attempt, &err) {
                Some(delay) => {
                    BOOTSTRAP_RETRIES.click();
                    tracing::info!(attempt, ?delay, "backend not answering yet, retrying");
                    self.set_status(Some(StatusLine::info(WAKING_UP_STATUS)), renderer);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    self.fail_bootstrap(&err, renderer);
                    return BootstrapOutcome::Failed;
                }
            }
        }

        let session_id = match self.storage.get(SESSION_KEY) {
            Some(session_id) => session_id,
            None => match bounded(
                self.config.bootstrap_timeout,
                "session creation",
                self.backend.create_session(),
            )
            .await
            {
                Ok(session_id) => {
                    SESSIONS_CREATED.click();
                    self.persist(SESSION_KEY, &session_id);
                    session_id
                }
                Err(err) => {
                    self.fail_bootstrap(&err, renderer);
                    return BootstrapOutcome::Failed;
                }
            },
        };
        tracing::info!(session_id = %session_id, "session ready");
        self.state.session_id = Some(session_id.clone());

        let mut messages = self.load_history(&session_id).await;
        if messages.is_empty() {
            messages.push(self.welcome_message());
        }
        self.state.transcript.replace(messages);
        renderer.print_transcript(self.state.transcript.messages(), self.config.max_sources);
        self.state.connected = true;
        self.set_status(None, renderer);
        self.start_monitor();
        BootstrapOutcome::Ready { session_id }
    }

    /// Delete the conversation on the backend and start over with a welcome message.
    ///
    /// Keeps the session identifier.  A no-op (returning false) without a session, while
    /// disconnected, or while a send is in progress.
    pub async fn reset(&mut self, renderer: &mut dyn Renderer) -> bool {
        if self.is_torn_down() || self.is_busy() || !self.state.connected {
            return false;
        }
        let Some(session_id) = self.state.session_id.clone() else {
            return false;
        };
        let cleared = bounded(
            self.config.request_timeout,
            "history clear",
            self.backend.clear_history(&session_id),
        )
        .await;
        match cleared {
            Ok(()) => {
                tracing::info!(session_id = %session_id, "conversation cleared");
                let welcome = self.welcome_message();
                self.state.transcript.replace(vec![welcome]);
                renderer.print_transcript(self.state.transcript.messages(), self.config.max_sources);
                true
            }
            Err(err) => {
                tracing::warn!("clearing history failed: {}", err);
                let message = Message::error(self.next_message_id(), RESET_FAILED_REPLY);
                renderer.print_message(&message, self.config.max_sources);
                self.state.transcript.push(message);
                false
            }
        }
    }

    /// Write the transcript to `path` as JSON.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile {
            version: 1,
            session_id: self.state.session_id.as_deref(),
            messages: self.state.transcript.messages(),
        };
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    async fn load_history(&mut self, session_id: &str) -> Vec<Message> {
        let loaded = bounded(
            self.config.request_timeout,
            "history load",
            self.backend.history(session_id),
        )
        .await;
        match loaded {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| entry.into_message(self.next_message_id()))
                .collect(),
            Err(err) => {
                HISTORY_LOAD_FAILURES.click();
                tracing::debug!("history unavailable, starting fresh: {}", err);
                Vec::new()
            }
        }
    }

    fn fail_bootstrap(&mut self, err: &Error, renderer: &mut dyn Renderer) {
        BOOTSTRAP_FAILURES.click();
        tracing::warn!("bootstrap failed: {}", err);
        self.stop_monitor();
        self.forget(SESSION_KEY);
        self.state.session_id = None;
        self.state.connected = false;
        let message = Message::error(self.next_message_id(), UNREACHABLE_REPLY);
        self.state.transcript.replace(vec![message]);
        renderer.print_transcript(self.state.transcript.messages(), self.config.max_sources);
        self.set_status(Some(StatusLine::error(UNREACHABLE_STATUS)), renderer);
    }

    fn welcome_message(&mut self) -> Message {
        Message::welcome(self.next_message_id(), self.config.welcome_message.clone())
    }
}
