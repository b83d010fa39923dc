//! The widget's state fields and the pure transitions over them.

use crate::theme::Theme;

use super::transcript::Transcript;

/// Standing status shown while health probes fail.
pub const DISCONNECTED_STATUS: &str = "Cannot reach the backend. Retrying in the background...";

/// Severity of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Transient, informational.
    Info,
    /// Something is wrong.
    Error,
}

/// The single line of status shown above the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Severity.
    pub level: StatusLevel,
    /// Text to show.
    pub text: String,
}

impl StatusLine {
    /// An informational status.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    /// An error status.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }

    /// True for error statuses.
    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }
}

/// Everything the widget shows or decides on.
#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    /// Visible messages.
    pub transcript: Transcript,
    /// Active session identifier.
    pub session_id: Option<String>,
    /// Client-observed backend reachability.
    pub connected: bool,
    /// Status line, if any.
    pub status: Option<StatusLine>,
    /// Color scheme.
    pub theme: Theme,
    /// Text typed but not yet sent.
    pub input: String,
}

impl WidgetState {
    /// Record reachability.  Only a change of value touches the status line: going down sets
    /// the standing disconnected error, coming back clears whatever error was standing.
    ///
    /// Returns true if the value changed.
    pub fn set_connected(&mut self, connected: bool) -> bool {
        if self.connected == connected {
            return false;
        }
        self.connected = connected;
        if connected {
            if self.status.as_ref().is_some_and(StatusLine::is_error) {
                self.status = None;
            }
        } else {
            self.status = Some(StatusLine::error(DISCONNECTED_STATUS));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_sets_error_once() {
        let mut state = WidgetState {
            connected: true,
            ..WidgetState::default()
        };
        assert!(state.set_connected(false));
        assert_eq!(state.status, Some(StatusLine::error(DISCONNECTED_STATUS)));

        state.status = Some(StatusLine::error("something else"));
        assert!(!state.set_connected(false));
        assert_eq!(state.status, Some(StatusLine::error("something else")));
    }

    #[test]
    fn reconnect_clears_error_only_on_transition() {
        let mut state = WidgetState::default();
        state.status = Some(StatusLine::error(DISCONNECTED_STATUS));
        assert!(state.set_connected(true));
        assert_eq!(state.status, None);

        state.status = Some(StatusLine::error("later problem"));
        assert!(!state.set_connected(true));
        assert!(state.status.is_some());
    }

    #[test]
    fn reconnect_keeps_info_status() {
        let mut state = WidgetState::default();
        state.status = Some(StatusLine::info("waking up"));
        assert!(state.set_connected(true));
        assert_eq!(state.status, Some(StatusLine::info("waking up")));
    }
}
