//! Session lifecycle: open, resume, time out, archive.
//!
//! A subject has at most one active session. Opening a new one archives
//! whatever was active; resuming an archived, cancelled, completed or
//! unknown session is refused with a restart notice rather than an
//! error, since stale session ids are an expected client condition.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::foundation::{SessionId, SubjectId, Timestamp};
use crate::domain::session::Session;
use crate::ports::{SessionStore, StoreError};

/// Outcome of resolving the session id on an inbound turn.
#[derive(Debug)]
pub enum SessionHandle {
    /// A usable session, freshly created or resumed.
    Ready {
        session: Session,
        /// True when the session was created this turn.
        fresh: bool,
    },
    /// The supplied id cannot be used; the client must start over.
    RestartRequired,
}

/// Session open/resume/timeout policy.
pub struct SessionLifecycle {
    store: Arc<dyn SessionStore>,
    timeout_minutes: i64,
}

impl SessionLifecycle {
    pub fn new(store: Arc<dyn SessionStore>, timeout_minutes: i64) -> Self {
        Self {
            store,
            timeout_minutes,
        }
    }

    /// Resolves the inbound session id into a usable session.
    ///
    /// The `new_session` sentinel archives any active sessions for the
    /// subject (best-effort) and creates a fresh one. A real id is
    /// loaded and must still be active; anything else asks the client
    /// to restart.
    pub async fn begin_or_resume(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
    ) -> Result<SessionHandle, StoreError> {
        if session_id.is_new_session_request() {
            return self.open_fresh(subject).await;
        }
        if session_id.is_sentinel() {
            // `session_end` is never a stored id.
            return Ok(SessionHandle::RestartRequired);
        }

        match self.store.find(subject, session_id).await? {
            Some(session) if session.status().is_active() => Ok(SessionHandle::Ready {
                session,
                fresh: false,
            }),
            Some(session) => {
                info!(
                    session_id = %session.id(),
                    status = %session.status(),
                    "refusing to resume inactive session"
                );
                Ok(SessionHandle::RestartRequired)
            }
            None => Ok(SessionHandle::RestartRequired),
        }
    }

    async fn open_fresh(&self, subject: &SubjectId) -> Result<SessionHandle, StoreError> {
        // One active session per subject: close the old ones first. A
        // failure here leaves stragglers behind but must not block the
        // new conversation.
        match self.store.archive_active(subject).await {
            Ok(0) => {}
            Ok(archived) => info!(archived, "archived previous active sessions"),
            Err(err) => warn!(error = %err, "failed to archive previous sessions"),
        }

        let session = Session::new(subject.clone());
        self.store.insert(&session).await?;
        info!(session_id = %session.id(), "opened new session");
        Ok(SessionHandle::Ready {
            session,
            fresh: true,
        })
    }

    /// True when the session has been idle past the inactivity window.
    pub fn timed_out(&self, session: &Session) -> bool {
        let idle = Timestamp::now().duration_since(&session.last_activity());
        idle.num_minutes() >= self.timeout_minutes
    }

    /// Runs the stored-schema upgrade and persists anything it changed.
    pub async fn upgrade_schema(&self, session: &mut Session) -> Result<(), StoreError> {
        let changed = session.upgrade_schema();
        if changed.is_empty() {
            return Ok(());
        }

        let patch = changed
            .iter()
            .filter_map(|key| {
                session
                    .context()
                    .get(key)
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect();
        self.store
            .merge_context(session.subject_id(), session.id(), patch)
            .await?;
        self.store
            .set_schema_version(session.subject_id(), session.id(), session.schema_version())
            .await?;
        info!(
            session_id = %session.id(),
            keys = changed.len(),
            "upgraded session schema"
        );
        Ok(())
    }
}
