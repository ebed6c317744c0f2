//! Turn request/response DTOs and the turn error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::DomainError;
use crate::ports::{Attachment, ExtractionError, StoreError};

/// Inbound turn: one user message or one document upload.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequest {
    #[serde(rename = "subjectId")]
    pub subject_id: String,

    /// Free-text user message.
    #[serde(default)]
    pub message: Option<String>,

    /// Opaque session token, or the `new_session` sentinel.
    #[serde(rename = "sessionId")]
    pub session_id: String,

    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Uploaded attachments; the engine processes the first.
    #[serde(default)]
    pub attachment: Option<Vec<Attachment>>,

    /// Pass-through identity payload from the auth layer.
    #[serde(default)]
    pub ekyc: Option<serde_json::Value>,
}

impl TurnRequest {
    /// Validates the transport shape: exactly one of message/attachment
    /// must be non-empty.
    pub fn validate(&self) -> Result<(), TurnError> {
        let has_message = self.message.as_deref().is_some_and(|m| !m.trim().is_empty());
        let has_attachment = self.attachment.as_deref().is_some_and(|a| !a.is_empty());

        match (has_message, has_attachment) {
            (true, false) | (false, true) => Ok(()),
            (true, true) => Err(TurnError::InvalidRequest(
                "Provide either a message or an attachment, not both".to_string(),
            )),
            (false, false) => Err(TurnError::InvalidRequest(
                "Either a message or an attachment is required".to_string(),
            )),
        }
    }

    /// First attachment, when this is an upload turn.
    pub fn first_attachment(&self) -> Option<&Attachment> {
        self.attachment.as_deref().and_then(|a| a.first())
    }
}

/// Response status block.
#[derive(Debug, Clone, Serialize)]
pub struct TurnStatus {
    pub code: u16,
    pub message: String,
}

/// Response payload.
#[derive(Debug, Clone, Serialize)]
pub struct TurnData {
    #[serde(rename = "messageId")]
    pub message_id: String,

    pub message: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "sessionId")]
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Vec<Attachment>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_type: Option<String>,

    #[serde(rename = "modelError", skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
}

/// Outbound turn response.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub status: TurnStatus,
    pub data: TurnData,
}

impl TurnResponse {
    /// Builds a successful response around the assistant reply.
    pub fn ok(data: TurnData) -> Self {
        Self {
            status: TurnStatus {
                code: 200,
                message: "success".to_string(),
            },
            data,
        }
    }
}

/// Why a turn failed.
///
/// Invalid requests are rejected before any session read and nothing is
/// persisted. Dependency failures abort the turn with a service error.
/// Completion failures never appear here: they degrade inside the turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_request(message: Option<&str>, attachments: usize) -> TurnRequest {
        TurnRequest {
            subject_id: "900101-14-5678".to_string(),
            message: message.map(str::to_string),
            session_id: "new_session".to_string(),
            created_at: None,
            attachment: (attachments > 0).then(|| {
                (0..attachments)
                    .map(|i| Attachment {
                        url: format!("https://files.example/{i}.jpg"),
                        name: format!("{i}.jpg"),
                        content_type: "image/jpeg".to_string(),
                    })
                    .collect()
            }),
            ekyc: None,
        }
    }

    #[test]
    fn message_only_is_valid() {
        assert!(base_request(Some("hello"), 0).validate().is_ok());
    }

    #[test]
    fn attachment_only_is_valid() {
        assert!(base_request(None, 1).validate().is_ok());
    }

    #[test]
    fn both_or_neither_are_rejected() {
        assert!(base_request(Some("hello"), 1).validate().is_err());
        assert!(base_request(None, 0).validate().is_err());
        assert!(base_request(Some("   "), 0).validate().is_err());
    }

    #[test]
    fn request_deserializes_from_wire_names() {
        let request: TurnRequest = serde_json::from_value(json!({
            "subjectId": "900101-14-5678",
            "message": "hello",
            "sessionId": "new_session",
            "createdAt": "2025-06-01T10:00:00Z",
        }))
        .unwrap();
        assert_eq!(request.subject_id, "900101-14-5678");
        assert_eq!(request.session_id, "new_session");
    }

    #[test]
    fn response_serializes_wire_names_and_omits_empty() {
        let response = TurnResponse::ok(TurnData {
            message_id: "m1".to_string(),
            message: "hi".to_string(),
            created_at: Utc::now(),
            session_id: "s1".to_string(),
            attachment: None,
            intent_type: Some("none".to_string()),
            model_error: None,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"]["code"], 200);
        assert_eq!(json["data"]["messageId"], "m1");
        assert!(json["data"].get("modelError").is_none());
    }
}
