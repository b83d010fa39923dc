//! A terminal chat client for a retrieval-augmented-generation backend.
//!
//! The backend is consumed as a black box over HTTP; see [`client::ChatBackend`].  The
//! interesting part is [`widget::Widget`], which manages the session, tracks connectivity,
//! dispatches messages, and reveals responses word by word.

// Public modules
pub mod client;
pub mod error;
pub mod observability;
pub mod storage;
pub mod theme;
pub mod types;
pub mod utils;
pub mod widget;

// Re-exports
pub use client::{ChatBackend, RagClient};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use theme::Theme;
pub use types::*;
