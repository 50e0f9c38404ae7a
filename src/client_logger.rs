//! Logging trait for kodeks client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows embedders
//! to capture and log all backend interactions passing through the
//! [`Kodeks`](crate::Kodeks) client.

use crate::types::SessionId;

/// A trait for logging kodeks client operations.
///
/// Implement this trait to capture session lifecycle events and the
/// individual text chunks of streamed answers.
///
/// # Example
///
/// ```rust,ignore
/// use kodeks::{ClientLogger, SessionId};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_session_created(&self, session: &SessionId) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "session created: {}", session).unwrap();
///     }
///
///     fn log_session_cleared(&self, session: &SessionId) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "session cleared: {}", session).unwrap();
///     }
///
///     fn log_query(&self, query: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "query: {}", query).unwrap();
///     }
///
///     fn log_chunk(&self, chunk: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "chunk: {}", chunk).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a freshly created session.
    ///
    /// Called once per successful `create_session` call.
    fn log_session_created(&self, session: &SessionId);

    /// Log a successful server-side history clear.
    fn log_session_cleared(&self, session: &SessionId);

    /// Log an outgoing streamed query.
    ///
    /// Called once per `query_stream` call, before the request is sent.
    fn log_query(&self, query: &str);

    /// Log an individual decoded chunk of a streamed answer.
    ///
    /// Called for each text chunk yielded by the stream, in receipt
    /// order.
    fn log_chunk(&self, chunk: &str);
}
