pub mod api;
pub mod message;
pub mod source;

pub use api::{ChatRequest, ChatResponse, HistoryEntry, HistoryResponse, SessionCreated};
pub use message::{Message, Sender};
pub use source::Source;
