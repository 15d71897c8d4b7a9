use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ids::{CourseId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course name cannot be empty")]
    EmptyName,

    #[error("end date is before start date")]
    InvalidDateRange,
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A registered course owned by a single user.
///
/// Courses are created from user input and never mutated afterwards; sessions
/// reference them by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    user_id: UserId,
    name: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    planned_hours: Option<u32>,
}

impl Course {
    /// Creates a new Course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyName` if the name is empty or whitespace-only.
    /// Returns `CourseError::InvalidDateRange` if both dates are present and
    /// the end date precedes the start date.
    pub fn new(
        id: CourseId,
        user_id: UserId,
        name: impl Into<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        planned_hours: Option<u32>,
    ) -> Result<Self, CourseError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CourseError::EmptyName);
        }
        if let (Some(start), Some(end)) = (start_date, end_date)
            && end < start
        {
            return Err(CourseError::InvalidDateRange);
        }

        Ok(Self {
            id,
            user_id,
            name: name.trim().to_owned(),
            start_date,
            end_date,
            planned_hours,
        })
    }

    /// Rehydrate a course from persisted storage, re-running validation.
    ///
    /// # Errors
    ///
    /// Same as [`Course::new`].
    pub fn from_persisted(
        id: CourseId,
        user_id: UserId,
        name: String,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        planned_hours: Option<u32>,
    ) -> Result<Self, CourseError> {
        Self::new(id, user_id, name, start_date, end_date, planned_hours)
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    #[must_use]
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Planned workload in whole hours, if the user set a target.
    #[must_use]
    pub fn planned_hours(&self) -> Option<u32> {
        self.planned_hours
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
