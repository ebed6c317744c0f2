//! In-memory session store.
//!
//! Mirrors the atomic-update semantics of the Postgres adapter closely
//! enough for tests: every partial update is applied under one write
//! lock, so a reader never observes a half-applied turn.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::domain::foundation::{SessionId, SessionStatus, SubjectId};
use crate::domain::session::{Session, TurnMessage};
use crate::domain::workflow::ServiceKind;
use crate::ports::{SessionStore, StoreError};

type Key = (SubjectId, SessionId);

/// Session store backed by a process-local map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Key, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        apply: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&(subject.clone(), session_id.clone()))
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        apply(session);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        let key = (session.subject_id().clone(), session.id().clone());
        self.sessions.write().await.insert(key, session.clone());
        Ok(())
    }

    async fn find(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&(subject.clone(), session_id.clone()))
            .cloned())
    }

    async fn merge_context(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        patch: BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        self.update(subject, session_id, |session| {
            for (key, value) in patch {
                session.context_mut().set(key, value);
            }
        })
        .await
    }

    async fn remove_context_keys(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        keys: &[String],
    ) -> Result<(), StoreError> {
        self.update(subject, session_id, |session| {
            for key in keys {
                session.context_mut().remove(key);
            }
        })
        .await
    }

    async fn push_messages(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        messages: &[TurnMessage],
    ) -> Result<(), StoreError> {
        self.update(subject, session_id, |session| {
            for message in messages {
                session.push_message(message.clone());
            }
        })
        .await
    }

    async fn set_status(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), StoreError> {
        let mut result = Ok(());
        self.update(subject, session_id, |session| {
            result = session
                .set_status(status)
                .map_err(|e| StoreError::Unavailable(e.to_string()));
        })
        .await?;
        result
    }

    async fn set_service(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        service: Option<ServiceKind>,
    ) -> Result<(), StoreError> {
        self.update(subject, session_id, |session| session.set_service(service))
            .await
    }

    async fn set_schema_version(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        version: u32,
    ) -> Result<(), StoreError> {
        // The snapshot upgrade already bumped the in-memory copy; for
        // this adapter a reinsert-time upgrade is a no-op, so this only
        // needs to exist for interface completeness.
        let _ = version;
        self.update(subject, session_id, |_| {}).await
    }

    async fn archive_active(&self, subject: &SubjectId) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let mut archived = 0;
        for ((owner, _), session) in sessions.iter_mut() {
            if owner == subject && session.status().is_active() {
                session
                    .set_status(SessionStatus::Archived)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                archived += 1;
            }
        }
        Ok(archived)
    }

    async fn clear_messages(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
    ) -> Result<(), StoreError> {
        self.update(subject, session_id, |session| session.clear_messages())
            .await
    }
}
