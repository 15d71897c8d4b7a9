use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use study_core::model::{Course, CourseId, SessionId, StudySession, UserId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn user_id_from_text(s: &str) -> Result<UserId, StorageError> {
    s.parse::<UserId>().map_err(ser)
}

pub(crate) fn course_id_from_text(s: &str) -> Result<CourseId, StorageError> {
    s.parse::<CourseId>().map_err(ser)
}

pub(crate) fn session_id_from_text(s: &str) -> Result<SessionId, StorageError> {
    s.parse::<SessionId>().map_err(ser)
}

pub(crate) fn planned_hours_from_i64(v: Option<i64>) -> Result<Option<u32>, StorageError> {
    v.map(|h| {
        u32::try_from(h).map_err(|_| StorageError::Serialization(format!("invalid planned_hours: {h}")))
    })
    .transpose()
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    let id = course_id_from_text(&row.try_get::<String, _>("id").map_err(ser)?)?;
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let planned_hours =
        planned_hours_from_i64(row.try_get::<Option<i64>, _>("planned_hours").map_err(ser)?)?;

    Course::from_persisted(
        id,
        user_id,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get("start_date").map_err(ser)?,
        row.try_get("end_date").map_err(ser)?,
        planned_hours,
    )
    .map_err(ser)
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<StudySession, StorageError> {
    let id = session_id_from_text(&row.try_get::<String, _>("id").map_err(ser)?)?;
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let course_id = course_id_from_text(&row.try_get::<String, _>("course_id").map_err(ser)?)?;

    let duration_i64: i64 = row.try_get("duration_minutes").map_err(ser)?;
    let duration_minutes = u32::try_from(duration_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid duration: {duration_i64}")))?;

    StudySession::from_persisted(
        id,
        course_id,
        user_id,
        row.try_get("start_time").map_err(ser)?,
        row.try_get("end_time").map_err(ser)?,
        duration_minutes,
        row.try_get("study_date").map_err(ser)?,
    )
    .map_err(ser)
}
