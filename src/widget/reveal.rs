//! Word-by-word disclosure of a response that has already arrived in full.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, MissedTickBehavior};

use crate::client::ChatBackend;
use crate::observability::REVEAL_TICKS;
use crate::types::{Message, Source};

use super::controller::{Event, Widget};
use super::render::Renderer;
use super::task::TaskGuard;

/// The tokens still to be shown and the message they are shown in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealState {
    message_id: String,
    tokens: Vec<String>,
    next: usize,
}

impl RevealState {
    /// Split `full_text` on whitespace for revealing into message `message_id`.
    pub fn new(message_id: impl Into<String>, full_text: &str) -> Self {
        Self {
            message_id: message_id.into(),
            tokens: full_text.split_whitespace().map(String::from).collect(),
            next: 0,
        }
    }

    /// The message being revealed into.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// True once every token has been appended.
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.tokens.len()
    }

    /// Number of tokens not yet appended.
    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.next
    }

    /// Append the next token to `text`, separated by a single space.  Returns the appended
    /// fragment, or `None` when exhausted.
    pub fn advance(&mut self, text: &mut String) -> Option<String> {
        let token = self.tokens.get(self.next)?;
        self.next += 1;
        let fragment = if text.is_empty() {
            token.clone()
        } else {
            format!(" {token}")
        };
        text.push_str(&fragment);
        Some(fragment)
    }
}

/// A running reveal: the token state plus the timer feeding it ticks.
#[derive(Debug)]
pub(crate) struct Reveal {
    pub(crate) id: u64,
    pub(crate) state: RevealState,
    ticker: TaskGuard,
}

impl Reveal {
    fn cancel(&mut self) {
        self.ticker.cancel();
    }
}

fn spawn_ticker(events: UnboundedSender<Event>, reveal: u64, interval: Duration) -> TaskGuard {
    let interval = interval.max(Duration::from_millis(1));
    TaskGuard::spawn(move |token| async move {
        let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticks.tick() => {
                    if events.send(Event::RevealTick { reveal }).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

impl<B: ChatBackend> Widget<B> {
    /// Start revealing `full_text` into a fresh streaming message at the tail.
    ///
    /// Any reveal already running is cancelled and its streaming message replaced.  Empty text
    /// finalizes immediately without starting a timer.
    pub fn reveal(&mut self, full_text: &str, sources: Vec<Source>, renderer: &mut dyn Renderer) {
        if self.is_torn_down() {
            return;
        }
        self.cancel_reveal();
        self.state.transcript.discard_streaming_tail();

        let message_id = self.next_message_id();
        let state = RevealState::new(message_id.clone(), full_text);
        self.state
            .transcript
            .push(Message::streaming(message_id, sources));

        if state.is_exhausted() {
            self.finalize_tail(renderer);
            return;
        }
        if let Some(tail) = self.state.transcript.last() {
            renderer.start_reveal(tail);
        }

        let id = self.next_generation();
        let ticker = spawn_ticker(self.events.clone(), id, self.config.reveal_interval);
        tracing::debug!(remaining = state.remaining(), "reveal started");
        self.reveal = Some(Reveal { id, state, ticker });
    }

    /// Apply one timer tick: append the next token, finalizing when none remain.
    pub(crate) fn reveal_tick(&mut self, reveal: u64, renderer: &mut dyn Renderer) {
        let Some(running) = self.reveal.as_mut().filter(|r| r.id == reveal) else {
            tracing::debug!(reveal, "stale reveal tick dropped");
            return;
        };
        REVEAL_TICKS.click();
        let Some(tail) = self
            .state
            .transcript
            .streaming_tail_mut()
            .filter(|m| m.id == running.state.message_id())
        else {
            self.cancel_reveal();
            return;
        };
        if let Some(fragment) = running.state.advance(&mut tail.text) {
            renderer.print_reveal_text(&fragment);
        }
        if running.state.is_exhausted() {
            self.cancel_reveal();
            self.finalize_tail(renderer);
        }
    }

    /// Stop the running reveal, if any.  Safe to call repeatedly.
    pub fn cancel_reveal(&mut self) {
        if let Some(mut running) = self.reveal.take() {
            running.cancel();
        }
    }

    fn finalize_tail(&mut self, renderer: &mut dyn Renderer) {
        let max_sources = self.config.max_sources;
        if let Some(tail) = self.state.transcript.streaming_tail_mut() {
            tail.is_streaming = false;
            renderer.finish_reveal(tail, max_sources);
        }
    }
}
