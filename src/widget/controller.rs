//! The widget controller: owns every piece of state and applies events one at a time.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::client::ChatBackend;
use crate::error::Result;
use crate::storage::{Storage, THEME_KEY};
use crate::theme::Theme;
use crate::types::{ChatResponse, Message};

use super::config::WidgetConfig;
use super::dispatch::InFlight;
use super::monitor::Monitor;
use super::render::Renderer;
use super::reveal::Reveal;
use super::state::{StatusLine, WidgetState};

/// Something that happened in the background and must be applied to the widget.
///
/// Each event is tagged with the generation of the task that produced it; events from a task
/// that has since been replaced or stopped are dropped.
#[derive(Debug)]
pub enum Event {
    /// A connectivity monitor probe finished.
    HealthPolled {
        /// Generation of the monitor that issued the probe.
        monitor: u64,
        /// Probe result.
        outcome: Result<()>,
    },
    /// A chat request finished.
    ChatCompleted {
        /// Generation of the dispatch.
        dispatch: u64,
        /// Response or failure.
        outcome: Result<ChatResponse>,
    },
    /// The reveal timer fired.
    RevealTick {
        /// Generation of the reveal.
        reveal: u64,
    },
}

/// A chat widget bound to one backend and one storage.
///
/// All mutation goes through the named transitions: [`Widget::bootstrap`], [`Widget::send`],
/// [`Widget::reveal`], [`Widget::reset`], [`Widget::handle`], [`Widget::teardown`].
/// Background tasks never touch the state; they post [`Event`]s that the owner feeds back
/// through [`Widget::pump`] or [`Widget::handle`].
pub struct Widget<B: ChatBackend> {
    pub(crate) backend: Arc<B>,
    pub(crate) storage: Box<dyn Storage>,
    pub(crate) config: WidgetConfig,
    pub(crate) state: WidgetState,
    pub(crate) events: UnboundedSender<Event>,
    inbox: UnboundedReceiver<Event>,
    pub(crate) monitor: Option<Monitor>,
    pub(crate) reveal: Option<Reveal>,
    pub(crate) in_flight: Option<InFlight>,
    generation: u64,
    message_seq: u64,
    torn_down: bool,
}

impl<B: ChatBackend> Widget<B> {
    /// Create a widget.  The theme is restored from `storage`; nothing else happens until
    /// [`Widget::bootstrap`].
    pub fn new(backend: B, storage: Box<dyn Storage>, config: WidgetConfig) -> Self {
        let theme = storage
            .get(THEME_KEY)
            .and_then(|t| t.parse::<Theme>().ok())
            .unwrap_or_default();
        let (events, inbox) = mpsc::unbounded_channel();
        Self {
            backend: Arc::new(backend),
            storage,
            config,
            state: WidgetState {
                theme,
                ..WidgetState::default()
            },
            events,
            inbox,
            monitor: None,
            reveal: None,
            in_flight: None,
            generation: 0,
            message_seq: 0,
            torn_down: false,
        }
    }

    /// The visible messages, oldest first.
    pub fn transcript(&self) -> &[Message] {
        self.state.transcript.messages()
    }

    /// The active session, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.state.session_id.as_deref()
    }

    /// Whether the backend is believed reachable.
    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// The status line, if any.
    pub fn status(&self) -> Option<&StatusLine> {
        self.state.status.as_ref()
    }

    /// The current theme.
    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    /// The unsent input buffer.
    pub fn input(&self) -> &str {
        &self.state.input
    }

    /// Replace the unsent input buffer.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input = text.into();
    }

    /// The configuration in force.
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// The storage holding the session id and theme.
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// True while a chat request is in flight or a response is still being revealed.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.reveal.is_some()
    }

    /// True once [`Widget::teardown`] has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Switch to the other theme and remember the choice.
    pub fn toggle_theme(&mut self, renderer: &mut dyn Renderer) -> Theme {
        let theme = self.state.theme.toggle();
        self.set_theme(theme, renderer);
        theme
    }

    /// Use `theme` and remember the choice.
    pub fn set_theme(&mut self, theme: Theme, renderer: &mut dyn Renderer) {
        self.state.theme = theme;
        self.persist(THEME_KEY, &theme.to_string());
        renderer.set_theme(theme);
    }

    /// Wait for the next background event.  Returns `None` once torn down.
    pub async fn next_event(&mut self) -> Option<Event> {
        if self.torn_down {
            return None;
        }
        self.inbox.recv().await
    }

    /// Wait for the next background event and apply it.  Returns false once torn down.
    ///
    /// Cancel-safe: if the returned future is dropped before an event arrives, no event is
    /// lost.
    pub async fn pump(&mut self, renderer: &mut dyn Renderer) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle(event, renderer);
                true
            }
            None => false,
        }
    }

    /// Apply every event that is already queued without waiting.  Returns how many were
    /// applied.
    pub fn drain(&mut self, renderer: &mut dyn Renderer) -> usize {
        let mut applied = 0;
        while !self.torn_down {
            match self.inbox.try_recv() {
                Ok(event) => {
                    self.handle(event, renderer);
                    applied += 1;
                }
                Err(_) => break,
            }
        }
        applied
    }

    /// Apply one event.  Ignored after teardown.
    pub fn handle(&mut self, event: Event, renderer: &mut dyn Renderer) {
        if self.torn_down {
            tracing::debug!(?event, "event after teardown ignored");
            return;
        }
        match event {
            Event::HealthPolled { monitor, outcome } => {
                self.health_polled(monitor, outcome, renderer)
            }
            Event::ChatCompleted { dispatch, outcome } => {
                self.chat_completed(dispatch, outcome, renderer)
            }
            Event::RevealTick { reveal } => self.reveal_tick(reveal, renderer),
        }
    }

    /// Stop every background task and refuse all further mutation.  Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.stop_monitor();
        self.cancel_reveal();
        if let Some(mut in_flight) = self.in_flight.take() {
            in_flight.abort();
        }
        self.inbox.close();
        self.torn_down = true;
        tracing::debug!("widget torn down");
    }

    pub(crate) fn set_connected(&mut self, connected: bool, renderer: &mut dyn Renderer) {
        if self.state.set_connected(connected) {
            tracing::info!(connected, "connectivity changed");
            renderer.print_status(self.state.status.as_ref());
        }
    }

    pub(crate) fn set_status(&mut self, status: Option<StatusLine>, renderer: &mut dyn Renderer) {
        self.state.status = status;
        renderer.print_status(self.state.status.as_ref());
    }

    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub(crate) fn next_message_id(&mut self) -> String {
        self.message_seq += 1;
        format!("msg-{}", self.message_seq)
    }

    pub(crate) fn persist(&mut self, key: &str, value: &str) {
        if let Err(err) = self.storage.set(key, value) {
            tracing::warn!(key, "could not persist value: {}", err);
        }
    }

    pub(crate) fn forget(&mut self, key: &str) {
        if let Err(err) = self.storage.remove(key) {
            tracing::warn!(key, "could not remove value: {}", err);
        }
    }
}

impl<B: ChatBackend> Drop for Widget<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
