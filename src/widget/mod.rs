//! The chat widget: a single controller that owns the transcript, session, and connectivity
//! state of one conversation with the backend.
//!
//! # Architecture
//!
//! - [`session`]: bootstrap with cold-start retry, history load, and reset
//! - [`monitor`]: periodic health probing that drives the connected flag
//! - [`dispatch`]: sending a message and handling its outcome
//! - [`reveal`]: word-by-word disclosure of a complete response
//! - [`controller`]: the [`Widget`] itself and its event loop
//! - [`config`], [`commands`], [`render`]: terminal front-end support

mod commands;
mod config;
mod controller;
mod dispatch;
mod monitor;
mod render;
mod reveal;
mod session;
mod state;
mod task;
mod transcript;

pub use commands::{WidgetCommand, help_text, parse_command};
pub use config::{WidgetArgs, WidgetConfig};
pub use controller::{Event, Widget};
pub use dispatch::{Dispatch, FAILURE_REPLY, Ignored, TIMEOUT_REPLY, truncate_chars};
pub use render::{PlainTextRenderer, Renderer};
pub use reveal::RevealState;
pub use session::{
    BootstrapOutcome, RESET_FAILED_REPLY, RetryPolicy, UNREACHABLE_REPLY, UNREACHABLE_STATUS,
    WAKING_UP_STATUS,
};
pub use state::{DISCONNECTED_STATUS, StatusLevel, StatusLine, WidgetState};
pub use transcript::Transcript;
