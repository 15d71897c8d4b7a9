//! Demo data for a freshly created database.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use storage::repository::Storage;
use study_core::Clock;
use study_core::model::CourseId;

use crate::course_service::{CourseDraft, CourseService};
use crate::error::DemoSeedError;
use crate::recorder::SessionRecorder;

/// What a seeding run created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoSeed {
    pub courses: usize,
    pub sessions: usize,
}

/// Populate an empty database with a couple of courses and recorded sessions
/// so the overview has something to show.
///
/// Sessions are recorded through the same timer flow the interactive path
/// uses, against a clock frozen at each session's start. No-op when the
/// signed-in user already has courses.
///
/// # Errors
///
/// Returns `DemoSeedError::Course` when nobody is signed in or a course
/// insert fails, and `DemoSeedError::Recorder` when recording a session
/// fails.
pub async fn seed_demo_data(
    storage: &Storage,
    now: DateTime<Utc>,
) -> Result<DemoSeed, DemoSeedError> {
    let service = CourseService::new(Arc::clone(&storage.auth), Arc::clone(&storage.courses));
    if !service.list_courses().await?.is_empty() {
        return Ok(DemoSeed {
            courses: 0,
            sessions: 0,
        });
    }

    let algebra = service
        .add_course(CourseDraft {
            name: "Algebra".into(),
            planned_hours: Some(80),
            ..CourseDraft::default()
        })
        .await?;
    let statistics = service
        .add_course(CourseDraft {
            name: "Statistics".into(),
            ..CourseDraft::default()
        })
        .await?;

    let plan = [
        (algebra.id(), 3, 30),
        (algebra.id(), 1, 45),
        (statistics.id(), 1, 20),
    ];
    for &(course_id, days_ago, minutes) in &plan {
        record_session(storage, course_id, now - Duration::days(days_ago), minutes).await?;
    }

    Ok(DemoSeed {
        courses: 2,
        sessions: plan.len(),
    })
}

async fn record_session(
    storage: &Storage,
    course_id: CourseId,
    start: DateTime<Utc>,
    minutes: u64,
) -> Result<(), DemoSeedError> {
    let mut recorder = SessionRecorder::init(
        Clock::fixed(start),
        Arc::clone(&storage.auth),
        Arc::clone(&storage.sessions),
        Arc::clone(&storage.preferences),
    )
    .await?;

    recorder.request_course_change(course_id).await?;
    recorder.start();
    for _ in 0..minutes * 60 {
        recorder.tick();
    }
    recorder.stop().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CourseServiceError;
    use crate::overview::aggregate_by_course;
    use storage::repository::InMemoryRepository;
    use study_core::model::{User, UserId};
    use study_core::time::fixed_now;

    #[tokio::test]
    async fn seeds_courses_and_sessions_once() {
        let repo = InMemoryRepository::new();
        repo.set_current_user(Some(User::new(UserId::new_random(), None)));
        let storage = Storage::from_in_memory(repo);

        let first = seed_demo_data(&storage, fixed_now()).await.unwrap();
        assert_eq!(
            first,
            DemoSeed {
                courses: 2,
                sessions: 3
            }
        );

        let user_id = storage.auth.current_user().await.unwrap().unwrap().id();
        let courses = storage.courses.list_courses(user_id).await.unwrap();
        let sessions = storage.sessions.list_sessions(user_id).await.unwrap();
        let aggregates = aggregate_by_course(courses, sessions);
        assert_eq!(aggregates[0].course.name(), "Algebra");
        assert_eq!(aggregates[0].total_minutes, 75);
        assert_eq!(aggregates[1].course.name(), "Statistics");
        assert_eq!(aggregates[1].total_minutes, 20);

        // Seeding again is a no-op.
        let again = seed_demo_data(&storage, fixed_now()).await.unwrap();
        assert_eq!(
            again,
            DemoSeed {
                courses: 0,
                sessions: 0
            }
        );
        assert_eq!(
            storage.sessions.list_sessions(user_id).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn seeding_requires_a_signed_in_user() {
        let storage = Storage::in_memory();
        let err = seed_demo_data(&storage, fixed_now()).await.unwrap_err();
        assert!(matches!(
            err,
            DemoSeedError::Course(CourseServiceError::SignedOut)
        ));
    }
}
