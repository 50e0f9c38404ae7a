//! Chat application module for interactive conversations with the
//! legal-assistant backend.
//!
//! This module provides the glue for the streaming REPL front end built
//! on top of the kodeks client library:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing and handling
//!
//! The conversation core itself (store, controller, decoder) lives at
//! the crate root; this module only carries the terminal-facing pieces.

mod commands;
mod config;

pub use crate::render::{PlainTextRenderer, SharedRenderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
