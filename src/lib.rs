// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod controller;
pub mod conversation;
pub mod decode;
pub mod error;
pub mod render;
pub mod types;

mod observability;

// Re-exports
pub use client::{AnswerStream, Backend, Kodeks};
pub use client_logger::ClientLogger;
pub use controller::{CLEARED_TEXT, Controller, ERROR_TEXT, PendingAnswer, WELCOME_TEXT};
pub use conversation::{Conversation, ConversationObserver, TurnIndex};
pub use decode::Utf8Decoder;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
