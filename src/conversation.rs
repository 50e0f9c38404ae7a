//! Conversation state: an ordered store of chat turns.
//!
//! The conversation is the single owner of displayed history. Turns are
//! append-only, with one exception: the trailing assistant turn is
//! extended in place while its answer streams in. Appends address turns
//! through [`TurnIndex`] handles, which become stale when the
//! conversation is reset; stale appends are dropped rather than allowed
//! to corrupt unrelated turns.

use crate::observability;
use crate::types::{Role, Turn};

/// A handle to a turn in the conversation.
///
/// The handle captures the conversation generation at append time. After
/// a reset (from a clear or a fresh session), handles from the previous
/// generation no longer resolve, which is how chunk deliveries from a
/// stream opened before the reset are suppressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnIndex {
    generation: u64,
    index: usize,
}

/// Observer for conversation mutations.
///
/// Invoked after every mutation with the current generation and the full
/// turn slice. There is no coalescing guarantee: rapid chunk appends may
/// each produce a notification, so implementations must be idempotent per
/// notification.
pub trait ConversationObserver: Send {
    /// Called after any mutation of the conversation.
    fn conversation_changed(&mut self, generation: u64, turns: &[Turn]);
}

/// The ordered, exclusively-owned sequence of chat turns.
#[derive(Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    generation: u64,
    observers: Vec<Box<dyn ConversationObserver>>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all history with a single system turn and invalidates
    /// every outstanding [`TurnIndex`].
    pub fn reset(&mut self, initial_system_text: &str) {
        self.turns.clear();
        self.turns.push(Turn::new(Role::System, initial_system_text));
        self.generation += 1;
        self.notify();
    }

    /// Appends a new turn and returns a handle to it.
    pub fn append_turn(&mut self, role: Role, text: impl Into<String>) -> TurnIndex {
        let index = self.turns.len();
        self.turns.push(Turn::new(role, text));
        let handle = TurnIndex {
            generation: self.generation,
            index,
        };
        self.notify();
        handle
    }

    /// Concatenates a fragment onto the addressed turn.
    ///
    /// Returns `false` without mutating anything when the handle is stale:
    /// either its generation predates a reset or its index is out of
    /// range. Stale appends are counted, never fatal.
    pub fn append_to_turn(&mut self, target: TurnIndex, fragment: &str) -> bool {
        if !self.contains(target) {
            observability::STALE_APPENDS.click();
            return false;
        }
        self.turns[target.index].text.push_str(fragment);
        self.notify();
        true
    }

    /// Returns true if the handle still addresses a live turn.
    pub fn contains(&self, target: TurnIndex) -> bool {
        target.generation == self.generation && target.index < self.turns.len()
    }

    /// Registers an observer for change notifications.
    pub fn subscribe(&mut self, observer: Box<dyn ConversationObserver>) {
        self.observers.push(observer);
    }

    /// Returns the current turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the current generation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if the conversation holds no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn notify(&mut self) {
        let turns = &self.turns;
        let generation = self.generation;
        for observer in &mut self.observers {
            observer.conversation_changed(generation, turns);
        }
    }
}
