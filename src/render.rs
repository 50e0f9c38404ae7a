//! Terminal rendering of the conversation.
//!
//! This module provides the plain-text presentation layer: an observer
//! that prints new turns and trailing-turn growth incrementally as the
//! store notifies it. Notifications carry the whole turn slice and may
//! arrive once per chunk, so rendering tracks what has already been
//! printed and emits only the difference — idempotent per notification.

use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex};

use crate::conversation::ConversationObserver;
use crate::types::{Role, Turn};

/// ANSI escape code for dim text (used for system notices).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for error turns).
const ANSI_RED: &str = "\x1b[31m";

/// Plain text renderer with optional ANSI styling.
///
/// Prints each turn under a role label; the trailing assistant turn is
/// printed as a growing suffix so streamed answers appear token by
/// token. User turns are not printed at all: the input prompt already
/// shows the user's line, and re-printing it would duplicate it. A
/// generation change (conversation reset) restarts rendering from a
/// blank slate.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    generation: u64,
    rendered_turns: usize,
    // Byte length of the trailing turn already printed; None when its
    // header has not been printed yet.
    rendered_tail: Option<usize>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            generation: 0,
            rendered_turns: 0,
            rendered_tail: None,
        }
    }

    /// Prints an informational message outside the conversation flow.
    pub fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }

    /// Prints an error message outside the conversation flow.
    pub fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn label(&self, role: Role) -> String {
        let plain = match role {
            Role::System => "[system]",
            Role::User => "You:",
            Role::Assistant => "Assistant:",
            Role::Error => "[error]",
        };
        if !self.use_color {
            return plain.to_string();
        }
        match role {
            Role::System => format!("{ANSI_DIM}{plain}{ANSI_RESET}"),
            Role::Assistant => format!("{ANSI_CYAN}{plain}{ANSI_RESET}"),
            Role::Error => format!("{ANSI_RED}{plain}{ANSI_RESET}"),
            Role::User => plain.to_string(),
        }
    }

    fn print_turn_header(&mut self, role: Role) {
        let label = self.label(role);
        print!("{label} ");
        self.flush();
    }

    fn print_turn_text(&mut self, role: Role, text: &str) {
        if self.use_color && role == Role::System {
            print!("{ANSI_DIM}{text}{ANSI_RESET}");
        } else if self.use_color && role == Role::Error {
            print!("{ANSI_RED}{text}{ANSI_RESET}");
        } else {
            print!("{text}");
        }
        self.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationObserver for PlainTextRenderer {
    fn conversation_changed(&mut self, generation: u64, turns: &[Turn]) {
        if generation != self.generation {
            // Reset: the old history is gone. Start a fresh section
            // rather than trying to unprint anything.
            self.generation = generation;
            self.rendered_turns = 0;
            self.rendered_tail = None;
            println!();
        }

        while self.rendered_turns < turns.len() {
            let index = self.rendered_turns;
            let is_trailing = index + 1 == turns.len();
            let turn = &turns[index];

            // The prompt already echoed the user's input.
            if turn.role == Role::User {
                self.rendered_turns += 1;
                self.rendered_tail = None;
                continue;
            }

            let printed = match self.rendered_tail {
                Some(printed) => printed,
                None => {
                    self.print_turn_header(turn.role);
                    0
                }
            };
            if turn.text.len() > printed {
                self.print_turn_text(turn.role, &turn.text[printed..]);
            }
            self.rendered_tail = Some(turn.text.len());

            if is_trailing {
                // May still grow; leave the line open.
                break;
            }
            println!();
            self.rendered_turns += 1;
            self.rendered_tail = None;
        }
    }
}

/// A clonable handle sharing one renderer between the conversation
/// subscription and the REPL loop.
#[derive(Clone)]
pub struct SharedRenderer {
    inner: Arc<Mutex<PlainTextRenderer>>,
}

impl SharedRenderer {
    /// Creates a shared renderer with the given color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlainTextRenderer::with_color(use_color))),
        }
    }

    /// Prints an informational message outside the conversation flow.
    pub fn print_info(&self, info: &str) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.print_info(info);
    }

    /// Prints an error message outside the conversation flow.
    pub fn print_error(&self, error: &str) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.print_error(error);
    }

    /// Closes the trailing turn's line after an answer finishes
    /// streaming.
    pub fn finish_response(&self) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.rendered_tail.is_some() {
            println!();
            inner.rendered_turns += 1;
            inner.rendered_tail = None;
        }
    }
}

impl ConversationObserver for SharedRenderer {
    fn conversation_changed(&mut self, generation: u64, turns: &[Turn]) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.conversation_changed(generation, turns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn labels_without_color_are_plain() {
        let renderer = PlainTextRenderer::with_color(false);
        assert_eq!(renderer.label(Role::User), "You:");
        assert_eq!(renderer.label(Role::Assistant), "Assistant:");
    }

    #[test]
    fn user_turns_are_not_reprinted() {
        let mut renderer = PlainTextRenderer::with_color(false);
        let turns = vec![
            Turn::new(Role::System, "Welcome!"),
            Turn::new(Role::User, "What is article 1?"),
        ];
        renderer.conversation_changed(1, &turns);

        // Both turns are accounted for, and the trailing user turn left
        // no line open for finish_response to close.
        assert_eq!(renderer.rendered_turns, 2);
        assert!(renderer.rendered_tail.is_none());
    }

    #[test]
    fn assistant_turn_after_user_turn_still_renders() {
        let mut renderer = PlainTextRenderer::with_color(false);
        let mut turns = vec![
            Turn::new(Role::System, "Welcome!"),
            Turn::new(Role::User, "What is article 1?"),
        ];
        renderer.conversation_changed(1, &turns);

        turns.push(Turn::new(Role::Assistant, "Article 1 states"));
        renderer.conversation_changed(1, &turns);
        assert_eq!(renderer.rendered_turns, 2);
        assert_eq!(renderer.rendered_tail, Some("Article 1 states".len()));
    }
}
