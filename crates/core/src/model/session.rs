use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, SessionId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("end time is before start time")]
    InvalidTimeRange,

    #[error("session duration does not fit in whole minutes")]
    DurationOverflow,

    #[error("study date does not match the start timestamp")]
    DateMismatch,
}

/// One completed timed interval attributed to a course.
///
/// Sessions are created exactly once per completed timer run and are immutable
/// afterwards; the only later operation is bulk deletion by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySession {
    id: SessionId,
    course_id: CourseId,
    user_id: UserId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_minutes: u32,
    study_date: NaiveDate,
}

impl StudySession {
    /// Build a session from a measured interval.
    ///
    /// Duration is `round((end - start) in ms / 60000)` with ties rounding up,
    /// and the study date is the UTC calendar date of the start timestamp.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTimeRange` if `end` precedes `start`.
    pub fn from_interval(
        id: SessionId,
        course_id: CourseId,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if end < start {
            return Err(SessionError::InvalidTimeRange);
        }
        let duration_minutes = round_minutes(start, end)?;

        Ok(Self {
            id,
            course_id,
            user_id,
            start_time: start,
            end_time: end,
            duration_minutes,
            study_date: start.date_naive(),
        })
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTimeRange` if timestamps are reversed.
    /// Returns `SessionError::DateMismatch` if the stored date does not match
    /// the start timestamp's UTC date.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        course_id: CourseId,
        user_id: UserId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_minutes: u32,
        study_date: NaiveDate,
    ) -> Result<Self, SessionError> {
        if end_time < start_time {
            return Err(SessionError::InvalidTimeRange);
        }
        if study_date != start_time.date_naive() {
            return Err(SessionError::DateMismatch);
        }

        Ok(Self {
            id,
            course_id,
            user_id,
            start_time,
            end_time,
            duration_minutes,
            study_date,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// UTC calendar date of the session, derived from the start timestamp.
    #[must_use]
    pub fn study_date(&self) -> NaiveDate {
        self.study_date
    }
}

// Round-half-up in integer math; callers guarantee end >= start.
fn round_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<u32, SessionError> {
    let ms = (end - start).num_milliseconds();
    let minutes = (ms + 30_000) / 60_000;
    u32::try_from(minutes).map_err(|_| SessionError::DurationOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<StudySession, SessionError> {
        StudySession::from_interval(
            SessionId::new_random(),
            CourseId::new_random(),
            UserId::new_random(),
            start,
            end,
        )
    }

    #[test]
    fn rejects_reversed_interval() {
        let now = fixed_now();
        let err = build(now, now - Duration::seconds(1)).unwrap_err();
        assert_eq!(err, SessionError::InvalidTimeRange);
    }

    #[test]
    fn duration_rounds_half_up() {
        let now = fixed_now();
        // 29.5 minutes rounds to 30, 29 min 29 s rounds to 29.
        let up = build(now, now + Duration::seconds(29 * 60 + 30)).unwrap();
        assert_eq!(up.duration_minutes(), 30);
        let down = build(now, now + Duration::seconds(29 * 60 + 29)).unwrap();
        assert_eq!(down.duration_minutes(), 29);
    }

    #[test]
    fn zero_length_interval_is_zero_minutes() {
        let now = fixed_now();
        let session = build(now, now).unwrap();
        assert_eq!(session.duration_minutes(), 0);
    }

    #[test]
    fn study_date_is_utc_date_of_start() {
        // 23:55 UTC start, run crosses midnight; the date stays with the start.
        let start = DateTime::parse_from_rfc3339("2024-05-10T23:55:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let session = build(start, start + Duration::minutes(20)).unwrap();
        assert_eq!(
            session.study_date(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
        );
    }

    #[test]
    fn from_persisted_rejects_date_mismatch() {
        let now = fixed_now();
        let err = StudySession::from_persisted(
            SessionId::new_random(),
            CourseId::new_random(),
            UserId::new_random(),
            now,
            now + Duration::minutes(5),
            5,
            now.date_naive() + Duration::days(1),
        )
        .unwrap_err();
        assert_eq!(err, SessionError::DateMismatch);
    }
}
