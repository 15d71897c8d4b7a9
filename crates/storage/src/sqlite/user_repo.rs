use async_trait::async_trait;
use sqlx::Row;

use study_core::model::User;

use super::SqliteRepository;
use super::mapping::{ser, user_id_from_text};
use crate::repository::{AuthProvider, StorageError};

#[async_trait]
impl AuthProvider for SqliteRepository {
    async fn current_user(&self) -> Result<Option<User>, StorageError> {
        // Single-user deployment: the one row in `users` is the signed-in
        // identity, no row means signed out.
        let row = sqlx::query("SELECT id, email FROM users ORDER BY rowid ASC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => {
                let id = user_id_from_text(&row.try_get::<String, _>("id").map_err(ser)?)?;
                let email: Option<String> = row.try_get("email").map_err(ser)?;
                Ok(Some(User::new(id, email)))
            }
            None => Ok(None),
        }
    }
}

impl SqliteRepository {
    /// Persist or update the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO users (id, email)
            VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET email = excluded.email
            ",
        )
        .bind(user.id().to_string())
        .bind(user.email())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
