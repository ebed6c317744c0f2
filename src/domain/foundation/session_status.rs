//! SessionStatus enum for tracking lifecycle of conversation sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a conversation session.
///
/// At most one session per subject is `Active` at any time; creating a
/// new session archives any prior active ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    /// Superseded by a newer session (or timed out into a new one).
    Archived,
    /// Explicitly terminated by the user mid-flow.
    Cancelled,
    /// Reached a graceful end of conversation.
    Completed,
}

impl SessionStatus {
    /// Returns true if the session can still accept turns.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    /// Validates a transition from this status to another.
    ///
    /// Valid transitions:
    /// - Active -> Archived | Cancelled | Completed
    pub fn can_transition_to(&self, target: &SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Active, Archived) | (Active, Cancelled) | (Active, Completed)
        )
    }

    /// Stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Archived => "archived",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Completed => "completed",
        }
    }

    /// Parses the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionStatus::Active),
            "archived" => Some(SessionStatus::Archived),
            "cancelled" => Some(SessionStatus::Cancelled),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
