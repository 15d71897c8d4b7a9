use study_core::model::{SessionId, StudySession, UserId};

use super::SqliteRepository;
use super::mapping::map_session_row;
use crate::repository::{SessionRepository, StorageError};

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_session(&self, session: &StudySession) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO study_sessions (
                id, user_id, course_id, start_time, end_time,
                duration_minutes, study_date
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(session.id().to_string())
        .bind(session.user_id().to_string())
        .bind(session.course_id().to_string())
        .bind(session.start_time())
        .bind(session.end_time())
        .bind(i64::from(session.duration_minutes()))
        .bind(session.study_date())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => StorageError::Connection(other.to_string()),
        })?;

        Ok(())
    }

    async fn list_sessions(&self, user_id: UserId) -> Result<Vec<StudySession>, StorageError> {
        // rowid keeps insertion order stable inside one study date.
        let rows = sqlx::query(
            r"
            SELECT id, user_id, course_id, start_time, end_time,
                   duration_minutes, study_date
            FROM study_sessions
            WHERE user_id = ?1
            ORDER BY study_date DESC, rowid ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            sessions.push(map_session_row(&row)?);
        }
        Ok(sessions)
    }

    async fn delete_sessions(&self, ids: &[SessionId]) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for id in ids {
            sqlx::query("DELETE FROM study_sessions WHERE id = ?1")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}
