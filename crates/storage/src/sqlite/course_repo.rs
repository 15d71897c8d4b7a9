use study_core::model::{Course, UserId};

use super::SqliteRepository;
use super::mapping::map_course_row;
use crate::repository::{CourseRepository, StorageError};

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError> {
        let planned_hours = course.planned_hours().map(i64::from);

        sqlx::query(
            r"
            INSERT INTO courses (id, user_id, name, start_date, end_date, planned_hours)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(course.id().to_string())
        .bind(course.user_id().to_string())
        .bind(course.name())
        .bind(course.start_date())
        .bind(course.end_date())
        .bind(planned_hours)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => StorageError::Connection(other.to_string()),
        })?;

        Ok(())
    }

    async fn list_courses(&self, user_id: UserId) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, start_date, end_date, planned_hours
            FROM courses
            WHERE user_id = ?1
            ORDER BY name ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            courses.push(map_course_row(&row)?);
        }
        Ok(courses)
    }
}
