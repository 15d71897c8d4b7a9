use chrono::Duration;
use study_core::model::{Course, CourseId, SessionId, StudySession, User, UserId};
use study_core::time::fixed_now;
use storage::repository::{
    AuthProvider, CourseRepository, PreferenceRepository, SessionRepository, Storage,
};
use storage::sqlite::SqliteRepository;

fn build_course(user_id: UserId, name: &str) -> Course {
    Course::new(
        CourseId::new_random(),
        user_id,
        name,
        Some(fixed_now().date_naive()),
        None,
        Some(120),
    )
    .unwrap()
}

fn build_session(user_id: UserId, course_id: CourseId, day_offset: i64) -> StudySession {
    let start = fixed_now() + Duration::days(day_offset);
    StudySession::from_interval(
        SessionId::new_random(),
        course_id,
        user_id,
        start,
        start + Duration::minutes(45),
    )
    .unwrap()
}

async fn signed_in_repo(db: &str) -> (SqliteRepository, UserId) {
    let repo = SqliteRepository::connect(db).await.expect("connect");
    repo.migrate().await.expect("migrate");
    let user = User::new(UserId::new_random(), Some("test@example.com".into()));
    repo.save_user(&user).await.expect("save user");
    (repo, user.id())
}

#[tokio::test]
async fn current_user_is_none_before_sign_in() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_no_user?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.current_user().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_roundtrips_courses_in_name_order() {
    let (repo, user_id) =
        signed_in_repo("sqlite:file:memdb_courses?mode=memory&cache=shared").await;

    let stats = build_course(user_id, "Statistics");
    let algebra = build_course(user_id, "Algebra");
    repo.insert_course(&stats).await.unwrap();
    repo.insert_course(&algebra).await.unwrap();

    let courses = repo.list_courses(user_id).await.unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0], algebra);
    assert_eq!(courses[1], stats);
}

#[tokio::test]
async fn sqlite_orders_sessions_by_date_desc_with_stable_ties() {
    let (repo, user_id) =
        signed_in_repo("sqlite:file:memdb_sessions?mode=memory&cache=shared").await;
    let course = build_course(user_id, "Physics");
    repo.insert_course(&course).await.unwrap();

    let older = build_session(user_id, course.id(), -3);
    let tie_first = build_session(user_id, course.id(), 0);
    let tie_second = build_session(user_id, course.id(), 0);
    repo.insert_session(&older).await.unwrap();
    repo.insert_session(&tie_first).await.unwrap();
    repo.insert_session(&tie_second).await.unwrap();

    let sessions = repo.list_sessions(user_id).await.unwrap();
    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions[0].id(), tie_first.id());
    assert_eq!(sessions[1].id(), tie_second.id());
    assert_eq!(sessions[2].id(), older.id());
    // Full round trip including derived fields.
    assert_eq!(sessions[2], older);
}

#[tokio::test]
async fn sqlite_bulk_delete_removes_only_listed_ids() {
    let (repo, user_id) =
        signed_in_repo("sqlite:file:memdb_delete?mode=memory&cache=shared").await;
    let course = build_course(user_id, "Chemistry");
    repo.insert_course(&course).await.unwrap();

    let keep = build_session(user_id, course.id(), 0);
    let drop_a = build_session(user_id, course.id(), -1);
    let drop_b = build_session(user_id, course.id(), -2);
    for s in [&keep, &drop_a, &drop_b] {
        repo.insert_session(s).await.unwrap();
    }

    repo.delete_sessions(&[drop_a.id(), drop_b.id()])
        .await
        .unwrap();

    let sessions = repo.list_sessions(user_id).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id(), keep.id());

    // Empty list is a no-op.
    repo.delete_sessions(&[]).await.unwrap();
    assert_eq!(repo.list_sessions(user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn storage_aggregate_exposes_the_same_rows() {
    let db = "sqlite:file:memdb_aggregate?mode=memory&cache=shared";
    let (repo, user_id) = signed_in_repo(db).await;
    let course = build_course(user_id, "Biology");
    repo.insert_course(&course).await.unwrap();

    let storage = Storage::sqlite(db).await.expect("storage");
    let user = storage.auth.current_user().await.unwrap().expect("user");
    assert_eq!(user.id(), user_id);
    assert_eq!(
        storage.courses.list_courses(user_id).await.unwrap(),
        vec![course]
    );
}

#[tokio::test]
async fn sqlite_preferences_upsert() {
    let (repo, _user_id) =
        signed_in_repo("sqlite:file:memdb_prefs?mode=memory&cache=shared").await;

    assert_eq!(repo.get_preference("selected_course").await.unwrap(), None);
    repo.set_preference("selected_course", "first")
        .await
        .unwrap();
    repo.set_preference("selected_course", "second")
        .await
        .unwrap();
    assert_eq!(
        repo.get_preference("selected_course").await.unwrap(),
        Some("second".to_owned())
    );
}
