//! Turn messages - the append-only conversation transcript.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp};

/// Who produced a turn message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One side of a conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: Timestamp,

    /// Classified intent tag, recorded on user messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    /// Set on assistant messages when the completion service failed and
    /// a fallback reply was served instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
}

impl TurnMessage {
    /// Creates a user message with its classified intent.
    pub fn user(content: impl Into<String>, intent: Option<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
            timestamp: Timestamp::now(),
            intent,
            model_error: None,
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Timestamp::now(),
            intent: None,
            model_error: None,
        }
    }

    /// Attaches a completion-failure marker to an assistant message.
    pub fn with_model_error(mut self, error: impl Into<String>) -> Self {
        self.model_error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_carries_intent() {
        let msg = TurnMessage::user("yes", Some("affirmative".to_string()));
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.intent.as_deref(), Some("affirmative"));
        assert!(msg.model_error.is_none());
    }

    #[test]
    fn assistant_message_can_carry_model_error() {
        let msg = TurnMessage::assistant("Sorry, something went wrong.")
            .with_model_error("provider unavailable");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.model_error.as_deref(), Some("provider unavailable"));
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let msg = TurnMessage::assistant("Hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("intent").is_none());
        assert!(json.get("model_error").is_none());
        assert_eq!(json["role"], "assistant");
    }
}
