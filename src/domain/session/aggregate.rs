//! Session aggregate - the sole source of truth for one conversation.
//!
//! Every turn is handled by a stateless invocation; all continuity is
//! reconstructed from this document. Components derive their decisions
//! from the snapshot passed in, never from process memory.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, SessionId, SessionStatus, SubjectId, Timestamp};
use crate::domain::workflow::ServiceKind;

use super::context::SessionContext;
use super::message::{Role, TurnMessage};
use super::schema::{upgrade_context, CURRENT_SCHEMA_VERSION};

/// One conversation instance for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    subject_id: SubjectId,
    status: SessionStatus,

    /// Active service, if the conversation has bound one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service: Option<ServiceKind>,

    context: SessionContext,

    /// Append-only transcript.
    messages: Vec<TurnMessage>,

    #[serde(default = "default_schema_version")]
    schema_version: u32,

    created_at: Timestamp,
    updated_at: Timestamp,
}

fn default_schema_version() -> u32 {
    1
}

impl Session {
    /// Creates a fresh active session with empty context and transcript.
    pub fn new(subject_id: SubjectId) -> Self {
        let now = Timestamp::now();
        Self {
            id: SessionId::generate(),
            subject_id,
            status: SessionStatus::Active,
            service: None,
            context: SessionContext::new(),
            messages: Vec::new(),
            schema_version: CURRENT_SCHEMA_VERSION,
            created_at: now,
            updated_at: now,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn service(&self) -> Option<ServiceKind> {
        self.service
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn messages(&self) -> &[TurnMessage] {
        &self.messages
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Most recent assistant message, if any (re-served after timeouts
    /// and transcription failures).
    pub fn last_assistant_message(&self) -> Option<&TurnMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Timestamp of the latest activity: last message, else creation.
    pub fn last_activity(&self) -> Timestamp {
        self.messages
            .last()
            .map(|m| m.timestamp)
            .unwrap_or(self.created_at)
    }

    // ── Mutations (snapshot side; the store applies the same change
    //    as an atomic field update) ──────────────────────────────────

    /// Appends a turn message to the in-memory snapshot.
    pub fn push_message(&mut self, message: TurnMessage) {
        self.updated_at = message.timestamp;
        self.messages.push(message);
    }

    /// Transitions the session status, enforcing valid transitions.
    pub fn set_status(&mut self, status: SessionStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(&status) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot move session from {} to {}", self.status, status),
            )
            .with_detail("session_id", self.id.as_str()));
        }
        self.status = status;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Binds or clears the active service.
    pub fn set_service(&mut self, service: Option<ServiceKind>) {
        self.service = service;
        self.updated_at = Timestamp::now();
    }

    /// Empties the visible transcript (one-shot reset at service entry).
    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.updated_at = Timestamp::now();
    }

    /// Runs the schema upgrade once after load.
    ///
    /// Returns the context keys whose values changed (the caller
    /// persists those plus the bumped version), or an empty list when
    /// already current.
    pub fn upgrade_schema(&mut self) -> Vec<String> {
        if self.schema_version >= CURRENT_SCHEMA_VERSION {
            return Vec::new();
        }
        let changed = upgrade_context(self.schema_version, self.context.as_map_mut());
        self.schema_version = CURRENT_SCHEMA_VERSION;
        changed
    }
}
