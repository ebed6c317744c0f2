//! Session store port - document-oriented persistence for sessions.
//!
//! Sessions are keyed by (subject id, session id). The store supports
//! whole-document reads plus atomic partial updates: context-key merges,
//! context-key removals, and message pushes. There are no cross-document
//! transactions; the engine relies on single-document atomic field
//! updates to keep the read-modify-write race window small.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::foundation::{SessionId, SessionStatus, SubjectId};
use crate::domain::session::{Session, TurnMessage};
use crate::domain::workflow::ServiceKind;

/// Session store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted session does not exist.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The backing store is unavailable or the operation failed.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be decoded.
    #[error("corrupt session document: {0}")]
    Corrupt(String),
}

/// Port for session persistence.
///
/// All partial updates must be applied as single atomic operations
/// against the session document. Message pushes are commutative and safe
/// under concurrent turns; scalar updates are last-writer-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts a new session document.
    async fn insert(&self, session: &Session) -> Result<(), StoreError>;

    /// Loads a session by its key. Returns `None` when absent.
    async fn find(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, StoreError>;

    /// Atomically merges keys into the session's context map.
    async fn merge_context(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        patch: BTreeMap<String, Value>,
    ) -> Result<(), StoreError>;

    /// Atomically removes keys from the session's context map.
    async fn remove_context_keys(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        keys: &[String],
    ) -> Result<(), StoreError>;

    /// Appends messages to the transcript in one atomic push.
    ///
    /// Both sides of a turn are pushed together so the transcript never
    /// persists a user message without its assistant reply.
    async fn push_messages(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        messages: &[TurnMessage],
    ) -> Result<(), StoreError>;

    /// Updates the session status.
    async fn set_status(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), StoreError>;

    /// Sets or clears the active service tag.
    async fn set_service(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        service: Option<ServiceKind>,
    ) -> Result<(), StoreError>;

    /// Records the schema version after an upgrade.
    async fn set_schema_version(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        version: u32,
    ) -> Result<(), StoreError>;

    /// Archives every active session for a subject; returns how many
    /// were archived. Callers treat failure here as non-fatal.
    async fn archive_active(&self, subject: &SubjectId) -> Result<u64, StoreError>;

    /// Clears the visible transcript (one-shot UX reset at readiness).
    async fn clear_messages(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SessionStore) {}
    }
}
