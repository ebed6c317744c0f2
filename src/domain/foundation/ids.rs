//! Strongly-typed identifier value objects.
//!
//! Session identifiers are opaque string tokens rather than raw UUIDs
//! because the wire protocol reserves two sentinel tokens that are not
//! real session ids: `new_session` (client requests a fresh session) and
//! `session_end` (server tells the client to start clean).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ValidationError;

/// Sentinel token a client sends to request a brand-new session.
pub const NEW_SESSION_TOKEN: &str = "new_session";

/// Sentinel token the server returns when the client must start clean.
pub const SESSION_END_TOKEN: &str = "session_end";

/// Opaque identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a new random session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps a raw token received over the wire.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The `session_end` sentinel, returned to force a clean restart.
    pub fn end_marker() -> Self {
        Self(SESSION_END_TOKEN.to_string())
    }

    /// Returns true if this token requests creation of a new session.
    pub fn is_new_session_request(&self) -> bool {
        self.0 == NEW_SESSION_TOKEN
    }

    /// Returns true if this token is either sentinel (never a stored id).
    pub fn is_sentinel(&self) -> bool {
        self.0 == NEW_SESSION_TOKEN || self.0 == SESSION_END_TOKEN
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the authenticated subject (citizen) owning a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a subject id, rejecting empty input.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::empty_field("subject_id"));
        }
        Ok(Self(raw))
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized form for identity cross-checks: alphanumerics only,
    /// uppercased.
    pub fn normalized(&self) -> String {
        self.0
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_uppercase()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a single turn message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random MessageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
