//! PostgreSQL implementation of the session store.
//!
//! Each session is one JSONB document in the `sessions` table, keyed by
//! (subject_id, id). A mirrored `status` column exists for the
//! archive-active query; it is written together with the document.
//! Partial updates are single UPDATE statements over jsonb operators,
//! which gives the atomicity the port requires without transactions.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;

use crate::domain::foundation::{SessionId, SessionStatus, SubjectId};
use crate::domain::session::{Session, TurnMessage};
use crate::domain::workflow::ServiceKind;
use crate::ports::{SessionStore, StoreError};

/// Session store backed by PostgreSQL JSONB documents.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn db_error(e: sqlx::Error) -> StoreError {
        StoreError::Unavailable(e.to_string())
    }

    fn require_row(result: sqlx::postgres::PgQueryResult, id: &SessionId) -> Result<(), StoreError> {
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        let doc = serde_json::to_value(session)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (subject_id, id, status, doc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.subject_id().as_str())
        .bind(session.id().as_str())
        .bind(session.status().as_str())
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Ok(())
    }

    async fn find(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT doc FROM sessions
            WHERE subject_id = $1 AND id = $2
            "#,
        )
        .bind(subject.as_str())
        .bind(session_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_error)?;

        match row {
            Some(row) => {
                let doc: Value = row.try_get("doc").map_err(Self::db_error)?;
                let session = serde_json::from_value(doc)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn merge_context(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        patch: BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        let patch = serde_json::to_value(patch)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                doc = jsonb_set(
                    jsonb_set(doc, '{context}', (doc->'context') || $3::jsonb),
                    '{updated_at}', to_jsonb(now())
                ),
                updated_at = now()
            WHERE subject_id = $1 AND id = $2
            "#,
        )
        .bind(subject.as_str())
        .bind(session_id.as_str())
        .bind(patch)
        .execute(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Self::require_row(result, session_id)
    }

    async fn remove_context_keys(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        keys: &[String],
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                doc = jsonb_set(
                    jsonb_set(doc, '{context}', (doc->'context') - $3::text[]),
                    '{updated_at}', to_jsonb(now())
                ),
                updated_at = now()
            WHERE subject_id = $1 AND id = $2
            "#,
        )
        .bind(subject.as_str())
        .bind(session_id.as_str())
        .bind(keys)
        .execute(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Self::require_row(result, session_id)
    }

    async fn push_messages(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        messages: &[TurnMessage],
    ) -> Result<(), StoreError> {
        let rows = serde_json::to_value(messages)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                doc = jsonb_set(
                    jsonb_set(doc, '{messages}', (doc->'messages') || $3::jsonb),
                    '{updated_at}', to_jsonb(now())
                ),
                updated_at = now()
            WHERE subject_id = $1 AND id = $2
            "#,
        )
        .bind(subject.as_str())
        .bind(session_id.as_str())
        .bind(rows)
        .execute(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Self::require_row(result, session_id)
    }

    async fn set_status(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                status = $3,
                doc = jsonb_set(
                    jsonb_set(doc, '{status}', to_jsonb($3::text)),
                    '{updated_at}', to_jsonb(now())
                ),
                updated_at = now()
            WHERE subject_id = $1 AND id = $2
            "#,
        )
        .bind(subject.as_str())
        .bind(session_id.as_str())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Self::require_row(result, session_id)
    }

    async fn set_service(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        service: Option<ServiceKind>,
    ) -> Result<(), StoreError> {
        let result = match service {
            Some(service) => sqlx::query(
                r#"
                UPDATE sessions SET
                    doc = jsonb_set(doc, '{service}', to_jsonb($3::text)),
                    updated_at = now()
                WHERE subject_id = $1 AND id = $2
                "#,
            )
            .bind(subject.as_str())
            .bind(session_id.as_str())
            .bind(service.as_str())
            .execute(&self.pool)
            .await
            .map_err(Self::db_error)?,
            None => sqlx::query(
                r#"
                UPDATE sessions SET
                    doc = doc - 'service',
                    updated_at = now()
                WHERE subject_id = $1 AND id = $2
                "#,
            )
            .bind(subject.as_str())
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(Self::db_error)?,
        };

        Self::require_row(result, session_id)
    }

    async fn set_schema_version(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
        version: u32,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                doc = jsonb_set(doc, '{schema_version}', to_jsonb($3::int)),
                updated_at = now()
            WHERE subject_id = $1 AND id = $2
            "#,
        )
        .bind(subject.as_str())
        .bind(session_id.as_str())
        .bind(version as i32)
        .execute(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Self::require_row(result, session_id)
    }

    async fn archive_active(&self, subject: &SubjectId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                status = 'archived',
                doc = jsonb_set(doc, '{status}', '"archived"'),
                updated_at = now()
            WHERE subject_id = $1 AND status = 'active'
            "#,
        )
        .bind(subject.as_str())
        .execute(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Ok(result.rows_affected())
    }

    async fn clear_messages(
        &self,
        subject: &SubjectId,
        session_id: &SessionId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                doc = jsonb_set(doc, '{messages}', '[]'::jsonb),
                updated_at = now()
            WHERE subject_id = $1 AND id = $2
            "#,
        )
        .bind(subject.as_str())
        .bind(session_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(Self::db_error)?;

        Self::require_row(result, session_id)
    }
}
