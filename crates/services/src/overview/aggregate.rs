use std::collections::HashMap;

use study_core::model::{Course, CourseId, StudySession};

/// A course together with its total study time and its sessions, newest study
/// date first. Recomputed on every load, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseAggregate {
    pub course: Course,
    pub total_minutes: u64,
    pub sessions: Vec<StudySession>,
}

impl CourseAggregate {
    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course.id()
    }
}

/// Group sessions by course in one pass and sum their durations.
///
/// The returned aggregates keep the order of `courses` (name order from the
/// fetch); courses without sessions appear with an empty list and a zero
/// total. Each course's sessions are re-sorted by study date descending with
/// a stable sort, so the fetch order is the tie-break within one date.
/// Sessions referencing a course not present in `courses` are dropped.
#[must_use]
pub fn aggregate_by_course(
    courses: Vec<Course>,
    sessions: Vec<StudySession>,
) -> Vec<CourseAggregate> {
    let mut by_course: HashMap<CourseId, Vec<StudySession>> = HashMap::new();
    let mut totals: HashMap<CourseId, u64> = HashMap::new();
    for session in sessions {
        *totals.entry(session.course_id()).or_insert(0) +=
            u64::from(session.duration_minutes());
        by_course
            .entry(session.course_id())
            .or_default()
            .push(session);
    }

    courses
        .into_iter()
        .map(|course| {
            let mut sessions = by_course.remove(&course.id()).unwrap_or_default();
            sessions.sort_by(|a, b| b.study_date().cmp(&a.study_date()));
            let total_minutes = totals.get(&course.id()).copied().unwrap_or(0);
            CourseAggregate {
                course,
                total_minutes,
                sessions,
            }
        })
        .collect()
}

/// Total minutes across all aggregates.
#[must_use]
pub fn overall_minutes(aggregates: &[CourseAggregate]) -> u64 {
    aggregates.iter().map(|a| a.total_minutes).sum()
}
