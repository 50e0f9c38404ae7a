//! Conversation orchestration.
//!
//! The controller owns the conversation store and the session id, wires
//! decoded answer chunks into the trailing assistant turn, and enforces
//! the one-outbound-query-at-a-time rule. No error escapes its public
//! surface: transport and stream faults become counters or synthetic
//! error turns, and the caller stays interactive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;

use crate::client::{AnswerStream, Backend};
use crate::conversation::{Conversation, TurnIndex};
use crate::types::{Role, SessionId};

/// Fixed greeting shown when a session is created.
pub const WELCOME_TEXT: &str =
    "Hello! I am your legal assistant for the Criminal Code of Ukraine. Ask me any question.";

/// Fixed notice shown after the history is cleared.
pub const CLEARED_TEXT: &str = "Conversation history cleared. You can ask a new question.";

/// Fixed user-facing message for a failed query.
pub const ERROR_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// An answer stream that has been opened but not yet drained.
///
/// Holding this separately from the controller lets a caller interleave
/// other controller operations (notably [`Controller::clear`]) while the
/// answer is still arriving; chunk deliveries that outlive a reset are
/// dropped by the store's staleness guard.
pub struct PendingAnswer {
    stream: AnswerStream,
    target: TurnIndex,
}

/// Orchestrates session lifecycle, query submission, and chunk delivery.
pub struct Controller<B: Backend> {
    backend: B,
    conversation: Conversation,
    session: Option<SessionId>,
    in_flight: bool,
}

impl<B: Backend> Controller<B> {
    /// Creates a controller with an empty conversation and no session.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            conversation: Conversation::new(),
            session: None,
            in_flight: false,
        }
    }

    /// Creates the server-side session and seeds the welcome turn.
    ///
    /// On failure the conversation is left empty and the failure is only
    /// counted; no user-visible error turn is inserted. Queries submitted
    /// without a session proceed with a null session id.
    pub async fn start(&mut self) {
        match self.backend.create_session().await {
            Ok(session) => {
                self.session = Some(session);
                self.conversation.reset(WELCOME_TEXT);
            }
            Err(_) => {
                // Counted by the client; the conversation stays empty and
                // the app remains usable.
            }
        }
    }

    /// Submits a query, returning the pending answer to drain.
    ///
    /// Returns `None` without touching the store when `text` is blank or
    /// a send is already in flight. Otherwise the user turn and an empty
    /// assistant placeholder are appended (in that order, before any
    /// chunk), and the stream request is opened. Once the response is
    /// obtained the in-flight flag is released — deliberately before the
    /// answer finishes streaming, so the next message can be composed
    /// while this one renders. If opening the stream fails, an error turn
    /// is appended instead and `None` is returned.
    pub async fn submit(&mut self, text: &str) -> Option<PendingAnswer> {
        let text = text.trim();
        if text.is_empty() || self.in_flight {
            return None;
        }

        self.in_flight = true;
        self.conversation.append_turn(Role::User, text);
        let target = self.conversation.append_turn(Role::Assistant, "");

        match self.backend.query_stream(text, self.session.as_ref()).await {
            Ok(stream) => {
                // Intentional early unlock: the headers are in, so the
                // user may type again while chunks keep arriving.
                self.in_flight = false;
                Some(PendingAnswer { stream, target })
            }
            Err(_) => {
                self.conversation.append_turn(Role::Error, ERROR_TEXT);
                self.in_flight = false;
                None
            }
        }
    }

    /// Drains a pending answer, applying chunks in receipt order.
    ///
    /// Chunks addressing a turn invalidated by a reset are dropped
    /// silently. A mid-stream fault appends an error turn (suppressed
    /// when the target is stale) and stops the drain. Setting the
    /// interrupt flag stops pulling further chunks; whatever partial text
    /// arrived stays in place.
    pub async fn drain(&mut self, mut pending: PendingAnswer, interrupted: Arc<AtomicBool>) {
        while let Some(chunk) = pending.stream.next().await {
            if interrupted.load(Ordering::Relaxed) {
                return;
            }
            match chunk {
                Ok(text) => {
                    self.conversation.append_to_turn(pending.target, &text);
                }
                Err(_) => {
                    if self.conversation.contains(pending.target) {
                        self.conversation.append_turn(Role::Error, ERROR_TEXT);
                    }
                    return;
                }
            }
        }
    }

    /// Submits a query and drains the whole answer.
    pub async fn send(&mut self, text: &str, interrupted: Arc<AtomicBool>) {
        if let Some(pending) = self.submit(text).await {
            self.drain(pending, interrupted).await;
        }
    }

    /// Clears the server-held history and resets the conversation.
    ///
    /// A no-op without a session. On a clear failure the conversation is
    /// left unchanged and the failure is only counted. The reset bumps
    /// the store generation, so an answer still streaming for the old
    /// history stops having any effect; the transport request itself is
    /// not aborted.
    pub async fn clear(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        match self.backend.clear_session(&session).await {
            Ok(()) => {
                self.conversation.reset(CLEARED_TEXT);
            }
            Err(_) => {
                // Counted by the client; history stays as it was.
            }
        }
    }

    /// Returns the conversation store.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the conversation store for subscription.
    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    /// Returns the current session id, if a session exists.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Returns true while a submission awaits its response.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::types::Turn;
    use futures::stream;
    use std::sync::Mutex;

    /// Scripted backend: each submit consumes the next script entry.
    struct ScriptedBackend {
        session: Result<SessionId>,
        clear_result: Result<()>,
        answers: Mutex<Vec<Result<Vec<Result<String>>>>>,
    }

    impl ScriptedBackend {
        fn new(answers: Vec<Result<Vec<Result<String>>>>) -> Self {
            Self {
                session: Ok(SessionId::from("session-1")),
                clear_result: Ok(()),
                answers: Mutex::new(answers),
            }
        }

        fn without_session(mut self) -> Self {
            self.session = Err(Error::connection("refused", None));
            self
        }
    }

    #[async_trait::async_trait]
    impl Backend for ScriptedBackend {
        async fn create_session(&self) -> Result<SessionId> {
            self.session.clone()
        }

        async fn clear_session(&self, _session: &SessionId) -> Result<()> {
            self.clear_result.clone()
        }

        async fn query_stream(
            &self,
            _query: &str,
            _session: Option<&SessionId>,
        ) -> Result<AnswerStream> {
            let mut answers = self.answers.lock().unwrap();
            let next = if answers.is_empty() {
                Ok(Vec::new())
            } else {
                answers.remove(0)
            };
            let chunks = next?;
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    fn chunks(parts: &[&str]) -> Result<Vec<Result<String>>> {
        Ok(parts.iter().map(|p| Ok(p.to_string())).collect())
    }

    fn roles(turns: &[Turn]) -> Vec<Role> {
        turns.iter().map(|t| t.role).collect()
    }

    fn not_interrupted() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[tokio::test]
    async fn start_seeds_welcome_turn() {
        let backend = ScriptedBackend::new(vec![]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        assert!(controller.session_id().is_some());
        assert_eq!(controller.conversation().len(), 1);
        assert_eq!(controller.conversation().turns()[0].text, WELCOME_TEXT);
    }

    #[tokio::test]
    async fn failed_session_creation_leaves_conversation_empty() {
        let backend = ScriptedBackend::new(vec![]).without_session();
        let mut controller = Controller::new(backend);
        controller.start().await;

        assert!(controller.session_id().is_none());
        assert!(controller.conversation().is_empty());
    }

    #[tokio::test]
    async fn streamed_answer_lands_in_one_assistant_turn() {
        let backend = ScriptedBackend::new(vec![chunks(&["Article ", "1 states", "..."])]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        controller
            .send("What is article 1?", not_interrupted())
            .await;

        let turns = controller.conversation().turns();
        assert_eq!(
            roles(turns),
            vec![Role::System, Role::User, Role::Assistant]
        );
        assert_eq!(turns[1].text, "What is article 1?");
        assert_eq!(turns[2].text, "Article 1 states...");
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let backend = ScriptedBackend::new(vec![]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        assert!(controller.submit("").await.is_none());
        assert!(controller.submit("   \t  ").await.is_none());
        assert_eq!(controller.conversation().len(), 1);
    }

    #[tokio::test]
    async fn submit_is_a_no_op_while_in_flight() {
        let backend = ScriptedBackend::new(vec![chunks(&["ignored"])]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        controller.in_flight = true;
        assert!(controller.submit("question").await.is_none());
        assert_eq!(controller.conversation().len(), 1);
    }

    #[tokio::test]
    async fn input_is_trimmed() {
        let backend = ScriptedBackend::new(vec![chunks(&["answer"])]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        controller.send("  question  ", not_interrupted()).await;
        assert_eq!(controller.conversation().turns()[1].text, "question");
    }

    #[tokio::test]
    async fn failed_stream_open_appends_error_turn() {
        let backend =
            ScriptedBackend::new(vec![Err(Error::connection("refused", None))]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        assert!(controller.submit("question").await.is_none());

        let turns = controller.conversation().turns();
        assert_eq!(
            roles(turns),
            vec![Role::System, Role::User, Role::Assistant, Role::Error]
        );
        assert_eq!(turns[3].text, ERROR_TEXT);
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn mid_stream_fault_keeps_partial_text_and_appends_error_turn() {
        let backend = ScriptedBackend::new(vec![Ok(vec![
            Ok("Article ".to_string()),
            Err(Error::streaming("dropped", None)),
            Ok("never delivered".to_string()),
        ])]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        controller.send("question", not_interrupted()).await;

        let turns = controller.conversation().turns();
        assert_eq!(
            roles(turns),
            vec![Role::System, Role::User, Role::Assistant, Role::Error]
        );
        assert_eq!(turns[2].text, "Article ");
        assert_eq!(turns[3].text, ERROR_TEXT);
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn clear_resets_to_single_system_turn() {
        let backend = ScriptedBackend::new(vec![chunks(&["answer"])]);
        let mut controller = Controller::new(backend);
        controller.start().await;
        controller.send("question", not_interrupted()).await;
        assert_eq!(controller.conversation().len(), 3);

        controller.clear().await;
        let turns = controller.conversation().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[0].text, CLEARED_TEXT);
    }

    #[tokio::test]
    async fn clear_without_session_is_a_no_op() {
        let backend = ScriptedBackend::new(vec![]).without_session();
        let mut controller = Controller::new(backend);
        controller.start().await;

        controller.clear().await;
        assert!(controller.conversation().is_empty());
    }

    #[tokio::test]
    async fn failed_clear_leaves_history_unchanged() {
        let mut backend = ScriptedBackend::new(vec![chunks(&["answer"])]);
        backend.clear_result = Err(Error::internal_server("boom"));
        let mut controller = Controller::new(backend);
        controller.start().await;
        controller.send("question", not_interrupted()).await;

        controller.clear().await;
        assert_eq!(controller.conversation().len(), 3);
    }

    #[tokio::test]
    async fn chunks_from_stream_opened_before_clear_are_dropped() {
        let backend = ScriptedBackend::new(vec![chunks(&["late ", "chunks"])]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        let pending = controller.submit("question").await.unwrap();
        controller.clear().await;
        controller.drain(pending, not_interrupted()).await;

        // The reset is the only visible state; nothing from the stale
        // stream mutated or re-extended any turn, and no error turn
        // appeared either.
        let turns = controller.conversation().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, CLEARED_TEXT);
    }

    #[tokio::test]
    async fn mid_stream_fault_after_clear_is_suppressed() {
        let backend = ScriptedBackend::new(vec![Ok(vec![
            Ok("partial".to_string()),
            Err(Error::streaming("dropped", None)),
        ])]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        let pending = controller.submit("question").await.unwrap();
        controller.clear().await;
        controller.drain(pending, not_interrupted()).await;

        assert_eq!(controller.conversation().len(), 1);
    }

    #[tokio::test]
    async fn interrupt_stops_chunk_delivery() {
        let backend = ScriptedBackend::new(vec![chunks(&["first", "second"])]);
        let mut controller = Controller::new(backend);
        controller.start().await;

        let interrupted = Arc::new(AtomicBool::new(true));
        let pending = controller.submit("question").await.unwrap();
        controller.drain(pending, interrupted).await;

        // The placeholder stays; no chunk was applied after the interrupt.
        assert_eq!(controller.conversation().turns()[2].text, "");
    }

    #[tokio::test]
    async fn submit_without_session_still_queries() {
        let backend = ScriptedBackend::new(vec![chunks(&["unattributed answer"])]).without_session();
        let mut controller = Controller::new(backend);
        controller.start().await;
        assert!(controller.session_id().is_none());

        controller.send("question", not_interrupted()).await;
        let turns = controller.conversation().turns();
        assert_eq!(roles(turns), vec![Role::User, Role::Assistant]);
        assert_eq!(turns[1].text, "unattributed answer");
    }
}
