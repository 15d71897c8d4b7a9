use std::sync::Arc;

use chrono::Duration;
use services::{
    CourseChange, RecorderError, RecorderState, SELECTED_COURSE_KEY, SessionRecorder,
    SwitchDecision, SwitchResolution,
};
use storage::repository::{
    InMemoryRepository, PreferenceRepository, SessionRepository, StorageError,
};
use study_core::model::{CourseId, SessionId, StudySession, User, UserId};
use study_core::time::{fixed_clock, fixed_now};

async fn recorder(repo: &InMemoryRepository) -> SessionRecorder {
    SessionRecorder::init(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
    .await
    .unwrap()
}

fn sign_in(repo: &InMemoryRepository) -> UserId {
    let user = User::new(UserId::new_random(), Some("test@example.com".into()));
    let id = user.id();
    repo.set_current_user(Some(user));
    id
}

struct FailingSessions;

#[async_trait::async_trait]
impl SessionRepository for FailingSessions {
    async fn insert_session(&self, _session: &StudySession) -> Result<(), StorageError> {
        Err(StorageError::Connection("insert refused".into()))
    }

    async fn list_sessions(&self, _user_id: UserId) -> Result<Vec<StudySession>, StorageError> {
        Ok(Vec::new())
    }

    async fn delete_sessions(&self, _ids: &[SessionId]) -> Result<(), StorageError> {
        Err(StorageError::Connection("delete refused".into()))
    }
}

#[tokio::test]
async fn start_tick_stop_persists_one_session() {
    let repo = InMemoryRepository::new();
    let user_id = sign_in(&repo);
    let course_id = CourseId::new_random();

    let mut recorder = recorder(&repo).await;
    recorder.request_course_change(course_id).await.unwrap();
    assert!(recorder.start());

    // 90 seconds of study: 1.5 minutes rounds up to 2.
    for _ in 0..90 {
        recorder.tick();
    }
    assert_eq!(recorder.elapsed_secs(), 90);

    let saved = recorder.stop().await.unwrap().expect("session saved");
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.elapsed_secs(), 0);

    assert_eq!(saved.course_id(), course_id);
    assert_eq!(saved.user_id(), user_id);
    assert_eq!(saved.start_time(), fixed_now());
    assert_eq!(saved.end_time(), fixed_now() + Duration::seconds(90));
    assert_eq!(saved.duration_minutes(), 2);
    assert_eq!(saved.study_date(), fixed_now().date_naive());

    let stored = repo.list_sessions(user_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], saved);
}

#[tokio::test]
async fn stop_when_idle_is_a_no_op() {
    let repo = InMemoryRepository::new();
    sign_in(&repo);
    let mut recorder = recorder(&repo).await;

    assert_eq!(recorder.stop().await.unwrap(), None);
}

#[tokio::test]
async fn failed_insert_surfaces_and_leaves_timer_idle() {
    let repo = InMemoryRepository::new();
    sign_in(&repo);

    let mut recorder = SessionRecorder::init(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(FailingSessions),
        Arc::new(repo.clone()),
    )
    .await
    .unwrap();
    recorder
        .request_course_change(CourseId::new_random())
        .await
        .unwrap();
    assert!(recorder.start());
    recorder.tick();

    let err = recorder.stop().await.unwrap_err();
    assert!(matches!(err, RecorderError::Storage(_)));
    // Transient state was cleared before the insert; nothing retries.
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.elapsed_secs(), 0);
}

#[tokio::test]
async fn save_and_switch_persists_then_switches() {
    let repo = InMemoryRepository::new();
    let user_id = sign_in(&repo);
    let first = CourseId::new_random();
    let second = CourseId::new_random();

    let mut recorder = recorder(&repo).await;
    recorder.request_course_change(first).await.unwrap();
    assert!(recorder.start());
    for _ in 0..120 {
        recorder.tick();
    }

    let change = recorder.request_course_change(second).await.unwrap();
    assert_eq!(change, CourseChange::ConfirmationRequired);

    let resolution = recorder
        .resolve_switch(SwitchDecision::SaveAndSwitch)
        .await
        .unwrap();
    let SwitchResolution::Switched { saved: Some(saved) } = resolution else {
        panic!("expected a saved session");
    };

    // The run ended at the moment of confirmation.
    assert_eq!(saved.end_time(), fixed_now() + Duration::seconds(120));
    assert_eq!(saved.course_id(), first);
    assert_eq!(recorder.selected_course(), Some(second));
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(repo.list_sessions(user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn switch_without_saving_discards_the_interval() {
    let repo = InMemoryRepository::new();
    let user_id = sign_in(&repo);
    let first = CourseId::new_random();
    let second = CourseId::new_random();

    let mut recorder = recorder(&repo).await;
    recorder.request_course_change(first).await.unwrap();
    assert!(recorder.start());
    recorder.tick();
    recorder.request_course_change(second).await.unwrap();

    let resolution = recorder
        .resolve_switch(SwitchDecision::SwitchWithoutSaving)
        .await
        .unwrap();
    assert_eq!(resolution, SwitchResolution::Switched { saved: None });

    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.elapsed_secs(), 0);
    assert_eq!(recorder.selected_course(), Some(second));
    assert!(repo.list_sessions(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancel_keeps_the_run_and_the_old_course() {
    let repo = InMemoryRepository::new();
    sign_in(&repo);
    let first = CourseId::new_random();

    let mut recorder = recorder(&repo).await;
    recorder.request_course_change(first).await.unwrap();
    assert!(recorder.start());
    for _ in 0..10 {
        recorder.tick();
    }
    recorder
        .request_course_change(CourseId::new_random())
        .await
        .unwrap();

    let resolution = recorder
        .resolve_switch(SwitchDecision::Cancel)
        .await
        .unwrap();
    assert_eq!(resolution, SwitchResolution::Cancelled);

    assert!(matches!(recorder.state(), RecorderState::Running { .. }));
    assert_eq!(recorder.elapsed_secs(), 10);
    assert_eq!(recorder.selected_course(), Some(first));

    // The run is still live and can be stopped normally.
    recorder.tick();
    assert_eq!(recorder.elapsed_secs(), 11);
}

#[tokio::test]
async fn selection_is_remembered_across_recorders() {
    let repo = InMemoryRepository::new();
    sign_in(&repo);
    let course_id = CourseId::new_random();

    let mut first = recorder(&repo).await;
    assert_eq!(first.selected_course(), None);
    first.request_course_change(course_id).await.unwrap();

    assert_eq!(
        repo.get_preference(SELECTED_COURSE_KEY).await.unwrap(),
        Some(course_id.to_string())
    );

    let second = recorder(&repo).await;
    assert_eq!(second.selected_course(), Some(course_id));
}
