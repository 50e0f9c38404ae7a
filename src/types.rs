//! Core data types for the kodeks client.
//!
//! These cover the conversation model (roles and turns) and the wire
//! types exchanged with the backend.

use serde::{Deserialize, Serialize};

/// An opaque server-issued session identifier.
///
/// Obtained once from `session/new` and attached to every streamed query.
/// The server replaces its history on `clear`; the client only ever
/// reassigns the id wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_string())
    }
}

/// The attribution of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A fixed client-side notice (welcome or cleared message).
    System,
    /// Text the user submitted.
    User,
    /// Text streamed back from the backend.
    Assistant,
    /// A synthetic turn surfacing a failed query.
    Error,
}

/// One message in the conversation.
///
/// Turns are append-only except the most recent assistant turn, which is
/// mutated in place while its answer streams in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who the turn is attributed to.
    pub role: Role,
    /// The turn's accumulated text.
    pub text: String,
}

impl Turn {
    /// Creates a new turn.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Response body of `POST session/new`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    /// The newly created session identifier.
    pub session_id: SessionId,
}

/// Request body of `POST query/stream`.
///
/// `session_id` is `None` when session creation failed at startup; the
/// backend accepts such queries without attributing them to a history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question.
    pub query: String,
    /// The session to attribute the query to, if one exists.
    pub session_id: Option<SessionId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_serializes_transparently() {
        let id = SessionId::from("abc-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc-123\"");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn query_request_null_session() {
        let req = QueryRequest {
            query: "What is article 1?".to_string(),
            session_id: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["session_id"], serde_json::Value::Null);
        assert_eq!(json["query"], "What is article 1?");
    }
}
