//! Configuration types for the chat widget.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved configuration the
//! widget runs with.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use super::session::RetryPolicy;

/// Default maximum characters per message.
const DEFAULT_MAX_MESSAGE_LENGTH: usize = 1000;

/// Default delay between revealed words.
const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(100);

/// Default number of sources shown under an answer.
const DEFAULT_MAX_SOURCES: usize = 3;

/// Default delay between health probes.
const DEFAULT_HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default deadline for a single health probe from the monitor.
const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default deadline for the bootstrap probe and session creation; long enough for a cold start.
const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(60);

/// Default deadline for a chat request.
const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for history load and clear.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default greeting for an empty conversation.
const DEFAULT_WELCOME_MESSAGE: &str =
    "Hi! Ask me anything about the articles in the knowledge base and I'll cite my sources.";

/// Command-line arguments for the ragchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct WidgetArgs {
    /// Backend base URL.
    #[arrrg(
        optional,
        "Backend base URL (default: $RAGCHAT_API_URL or http://localhost:3001/)",
        "URL"
    )]
    pub url: Option<String>,

    /// Storage file for the session id and theme.
    #[arrrg(
        optional,
        "File holding the session id and theme (default: $RAGCHAT_STATE or ~/.ragchat.json)",
        "PATH"
    )]
    pub state: Option<String>,

    /// Maximum characters per message.
    #[arrrg(optional, "Max characters per message (default: 1000)", "CHARS")]
    pub max_length: Option<usize>,

    /// Milliseconds between revealed words.
    #[arrrg(optional, "Milliseconds between revealed words (default: 100)", "MS")]
    pub reveal_ms: Option<u64>,

    /// Maximum sources shown per answer.
    #[arrrg(optional, "Max sources shown per answer (default: 3)", "COUNT")]
    pub max_sources: Option<usize>,

    /// Seconds between health probes.
    #[arrrg(optional, "Seconds between health checks (default: 30)", "SECS")]
    pub poll_secs: Option<u64>,

    /// Seconds before a chat request is abandoned.
    #[arrrg(optional, "Seconds before a chat request times out (default: 30)", "SECS")]
    pub chat_timeout: Option<u64>,

    /// Log verbosity.
    #[arrrg(optional, "Log level: error, warn, info, debug, trace (default: warn)", "LEVEL")]
    pub log_level: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a widget.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Backend base URL; `None` defers to the environment.
    pub base_url: Option<String>,

    /// Storage file; `None` uses the default location.
    pub state_path: Option<PathBuf>,

    /// Longer messages are truncated to this many characters.
    pub max_message_length: usize,

    /// Delay between revealed words.
    pub reveal_interval: Duration,

    /// Sources shown under an answer.
    pub max_sources: usize,

    /// Delay between health probes.
    pub health_poll_interval: Duration,

    /// Deadline for a monitor health probe.
    pub health_timeout: Duration,

    /// Deadline for the bootstrap probe and session creation.
    pub bootstrap_timeout: Duration,

    /// Deadline for a chat request.
    pub chat_timeout: Duration,

    /// Deadline for history load and clear.
    pub request_timeout: Duration,

    /// Cold-start retry behavior.
    pub retry: RetryPolicy,

    /// Greeting for an empty conversation.
    pub welcome_message: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl WidgetConfig {
    /// Creates a new WidgetConfig with default values.
    pub fn new() -> Self {
        Self {
            base_url: None,
            state_path: None,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
            max_sources: DEFAULT_MAX_SOURCES,
            health_poll_interval: DEFAULT_HEALTH_POLL_INTERVAL,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            bootstrap_timeout: DEFAULT_BOOTSTRAP_TIMEOUT,
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            use_color: true,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the maximum message length.
    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.max_message_length = max;
        self
    }

    /// Sets the reveal interval.
    pub fn with_reveal_interval(mut self, interval: Duration) -> Self {
        self.reveal_interval = interval;
        self
    }

    /// Sets the number of sources shown.
    pub fn with_max_sources(mut self, max: usize) -> Self {
        self.max_sources = max;
        self
    }

    /// Sets the health poll interval.
    pub fn with_health_poll_interval(mut self, interval: Duration) -> Self {
        self.health_poll_interval = interval;
        self
    }

    /// Sets the monitor's health probe deadline.
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Sets the bootstrap deadline.
    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = timeout;
        self
    }

    /// Sets the chat request deadline.
    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    /// Sets the history load/clear deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the cold-start retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the welcome message.
    pub fn with_welcome_message(mut self, text: impl Into<String>) -> Self {
        self.welcome_message = text.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<WidgetArgs> for WidgetConfig {
    fn from(args: WidgetArgs) -> Self {
        let defaults = WidgetConfig::new();
        WidgetConfig {
            base_url: args.url,
            state_path: args.state.map(PathBuf::from),
            max_message_length: args
                .max_length
                .filter(|chars| *chars > 0)
                .unwrap_or(defaults.max_message_length),
            reveal_interval: args
                .reveal_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.reveal_interval),
            max_sources: args.max_sources.unwrap_or(defaults.max_sources),
            health_poll_interval: args
                .poll_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.health_poll_interval),
            chat_timeout: args
                .chat_timeout
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.chat_timeout),
            use_color: !args.no_color,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = WidgetConfig::new();
        assert!(config.base_url.is_none());
        assert_eq!(config.max_message_length, 1000);
        assert_eq!(config.reveal_interval, Duration::from_millis(100));
        assert_eq!(config.max_sources, 3);
        assert_eq!(config.health_poll_interval, Duration::from_secs(30));
        assert_eq!(config.bootstrap_timeout, Duration::from_secs(60));
        assert_eq!(config.chat_timeout, Duration::from_secs(30));
        assert_eq!(config.retry, RetryPolicy::new(1, Duration::from_secs(5)));
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = WidgetConfig::from(WidgetArgs::default());
        assert!(config.base_url.is_none());
        assert!(config.state_path.is_none());
        assert_eq!(config.max_message_length, 1000);
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_custom() {
        let args = WidgetArgs {
            url: Some("https://rag.example.com".to_string()),
            state: Some("/tmp/state.json".to_string()),
            max_length: Some(200),
            reveal_ms: Some(20),
            max_sources: Some(5),
            poll_secs: Some(0),
            chat_timeout: Some(90),
            log_level: Some("debug".to_string()),
            no_color: true,
        };
        let config = WidgetConfig::from(args);
        assert_eq!(config.base_url.as_deref(), Some("https://rag.example.com"));
        assert_eq!(config.state_path, Some(PathBuf::from("/tmp/state.json")));
        assert_eq!(config.max_message_length, 200);
        assert_eq!(config.reveal_interval, Duration::from_millis(20));
        assert_eq!(config.max_sources, 5);
        // A zero poll interval would spin; it falls back to the default.
        assert_eq!(config.health_poll_interval, Duration::from_secs(30));
        assert_eq!(config.chat_timeout, Duration::from_secs(90));
        assert!(!config.use_color);
    }

    #[test]
    fn config_from_args_ignores_zero_limits() {
        let args = WidgetArgs {
            max_length: Some(0),
            reveal_ms: Some(0),
            chat_timeout: Some(0),
            ..WidgetArgs::default()
        };
        let config = WidgetConfig::from(args);
        assert_eq!(config.max_message_length, 1000);
        assert_eq!(config.reveal_interval, Duration::from_millis(100));
        assert_eq!(config.chat_timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_builder_pattern() {
        let config = WidgetConfig::new()
            .with_base_url("http://10.0.0.2:8080/")
            .with_max_message_length(10)
            .with_reveal_interval(Duration::from_millis(5))
            .with_max_sources(1)
            .with_health_poll_interval(Duration::from_secs(2))
            .with_health_timeout(Duration::from_secs(1))
            .with_bootstrap_timeout(Duration::from_secs(3))
            .with_chat_timeout(Duration::from_secs(4))
            .with_request_timeout(Duration::from_secs(6))
            .with_retry(RetryPolicy::never())
            .with_welcome_message("hello")
            .without_color();

        assert_eq!(config.base_url.as_deref(), Some("http://10.0.0.2:8080/"));
        assert_eq!(config.max_message_length, 10);
        assert_eq!(config.reveal_interval, Duration::from_millis(5));
        assert_eq!(config.max_sources, 1);
        assert_eq!(config.health_poll_interval, Duration::from_secs(2));
        assert_eq!(config.health_timeout, Duration::from_secs(1));
        assert_eq!(config.bootstrap_timeout, Duration::from_secs(3));
        assert_eq!(config.chat_timeout, Duration::from_secs(4));
        assert_eq!(config.request_timeout, Duration::from_secs(6));
        assert_eq!(config.retry, RetryPolicy::never());
        assert_eq!(config.welcome_message, "hello");
        assert!(!config.use_color);
    }
}
