use std::sync::Arc;

use chrono::NaiveDate;

use storage::repository::{AuthProvider, CourseRepository};
use study_core::model::{Course, CourseId};

use crate::error::CourseServiceError;

/// User input for registering a course, before validation.
#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub planned_hours: Option<u32>,
}

/// Course registration and listing for the signed-in user.
#[derive(Clone)]
pub struct CourseService {
    auth: Arc<dyn AuthProvider>,
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>, courses: Arc<dyn CourseRepository>) -> Self {
        Self { auth, courses }
    }

    /// Validate a draft and persist it as a new course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::SignedOut` when nobody is signed in,
    /// `CourseServiceError::Course` when validation fails, and
    /// `CourseServiceError::Storage` when the insert fails.
    pub async fn add_course(&self, draft: CourseDraft) -> Result<Course, CourseServiceError> {
        let user = self
            .auth
            .current_user()
            .await?
            .ok_or(CourseServiceError::SignedOut)?;

        let course = Course::new(
            CourseId::new_random(),
            user.id(),
            draft.name,
            draft.start_date,
            draft.end_date,
            draft.planned_hours,
        )?;
        self.courses.insert_course(&course).await?;
        Ok(course)
    }

    /// List the signed-in user's courses, name ascending.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::SignedOut` when nobody is signed in, or
    /// `CourseServiceError::Storage` when the fetch fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CourseServiceError> {
        let user = self
            .auth
            .current_user()
            .await?
            .ok_or(CourseServiceError::SignedOut)?;
        Ok(self.courses.list_courses(user.id()).await?)
    }
}

/// Parse a day-first `d.m.yyyy` date input. Malformed input is treated as no
/// value, not as an error.
#[must_use]
pub fn parse_date_input(value: &str) -> Option<NaiveDate> {
    let mut parts = value.trim().split('.');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
