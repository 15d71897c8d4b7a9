use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use study_core::model::{Course, SessionId, StudySession, User, UserId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// The row-store's authentication surface: who is signed in, if anyone.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Fetch the currently signed-in user, or `None` when signed out.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the identity cannot be read.
    async fn current_user(&self) -> Result<Option<User>, StorageError>;
}

/// Repository contract for courses.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist a new course row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id already exists, or other
    /// storage errors.
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch all courses owned by `user_id`, ordered by name ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_courses(&self, user_id: UserId) -> Result<Vec<Course>, StorageError>;
}

/// Repository contract for study sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id already exists, or other
    /// storage errors.
    async fn insert_session(&self, session: &StudySession) -> Result<(), StorageError>;

    /// Fetch all sessions owned by `user_id`, ordered by study date
    /// descending. Ordering within one date follows insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_sessions(&self, user_id: UserId) -> Result<Vec<StudySession>, StorageError>;

    /// Bulk-delete sessions by id. Ids that do not exist are ignored; an empty
    /// list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_sessions(&self, ids: &[SessionId]) -> Result<(), StorageError>;
}

/// Durable key-value slot for small per-user preferences, such as the
/// remembered course selection.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Read a preference value, or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read fails.
    async fn get_preference(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write (or overwrite) a preference value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn set_preference(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    user: Arc<Mutex<Option<User>>>,
    courses: Arc<Mutex<Vec<Course>>>,
    sessions: Arc<Mutex<Vec<StudySession>>>,
    preferences: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the signed-in user. Test knob; the hosted row-store owns
    /// this in production.
    pub fn set_current_user(&self, user: Option<User>) {
        if let Ok(mut guard) = self.user.lock() {
            *guard = user;
        }
    }
}

fn lock_err<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl AuthProvider for InMemoryRepository {
    async fn current_user(&self) -> Result<Option<User>, StorageError> {
        let guard = self.user.lock().map_err(lock_err)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn insert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(lock_err)?;
        if guard.iter().any(|c| c.id() == course.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(course.clone());
        Ok(())
    }

    async fn list_courses(&self, user_id: UserId) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(lock_err)?;
        let mut courses: Vec<Course> = guard
            .iter()
            .filter(|c| c.user_id() == user_id)
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(courses)
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn insert_session(&self, session: &StudySession) -> Result<(), StorageError> {
        let mut guard = self.sessions.lock().map_err(lock_err)?;
        if guard.iter().any(|s| s.id() == session.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(session.clone());
        Ok(())
    }

    async fn list_sessions(&self, user_id: UserId) -> Result<Vec<StudySession>, StorageError> {
        let guard = self.sessions.lock().map_err(lock_err)?;
        let mut sessions: Vec<StudySession> = guard
            .iter()
            .filter(|s| s.user_id() == user_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order within one date.
        sessions.sort_by(|a, b| b.study_date().cmp(&a.study_date()));
        Ok(sessions)
    }

    async fn delete_sessions(&self, ids: &[SessionId]) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut guard = self.sessions.lock().map_err(lock_err)?;
        guard.retain(|s| !ids.contains(&s.id()));
        Ok(())
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryRepository {
    async fn get_preference(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.preferences.lock().map_err(lock_err)?;
        Ok(guard.get(key).cloned())
    }

    async fn set_preference(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.preferences.lock().map_err(lock_err)?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Aggregates the row-store surfaces behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub auth: Arc<dyn AuthProvider>,
    pub courses: Arc<dyn CourseRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self::from_in_memory(repo)
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let auth: Arc<dyn AuthProvider> = Arc::new(repo.clone());
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let preferences: Arc<dyn PreferenceRepository> = Arc::new(repo);
        Self {
            auth,
            courses,
            sessions,
            preferences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use study_core::model::CourseId;
    use study_core::time::fixed_now;

    fn build_course(user_id: UserId, name: &str) -> Course {
        Course::new(CourseId::new_random(), user_id, name, None, None, None).unwrap()
    }

    fn build_session(user_id: UserId, course_id: CourseId, day_offset: i64) -> StudySession {
        let start = fixed_now() + Duration::days(day_offset);
        StudySession::from_interval(
            SessionId::new_random(),
            course_id,
            user_id,
            start,
            start + Duration::minutes(30),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn courses_come_back_in_name_order() {
        let repo = InMemoryRepository::new();
        let user_id = UserId::new_random();
        repo.insert_course(&build_course(user_id, "Statistics"))
            .await
            .unwrap();
        repo.insert_course(&build_course(user_id, "Algebra"))
            .await
            .unwrap();

        let courses = repo.list_courses(user_id).await.unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].name(), "Algebra");
        assert_eq!(courses[1].name(), "Statistics");
    }

    #[tokio::test]
    async fn sessions_come_back_newest_date_first() {
        let repo = InMemoryRepository::new();
        let user_id = UserId::new_random();
        let course_id = CourseId::new_random();
        let older = build_session(user_id, course_id, -2);
        let newer = build_session(user_id, course_id, 0);
        repo.insert_session(&older).await.unwrap();
        repo.insert_session(&newer).await.unwrap();

        let sessions = repo.list_sessions(user_id).await.unwrap();
        assert_eq!(sessions[0].id(), newer.id());
        assert_eq!(sessions[1].id(), older.id());
    }

    #[tokio::test]
    async fn duplicate_session_id_conflicts() {
        let repo = InMemoryRepository::new();
        let user_id = UserId::new_random();
        let session = build_session(user_id, CourseId::new_random(), 0);
        repo.insert_session(&session).await.unwrap();
        let err = repo.insert_session(&session).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn delete_ignores_unknown_ids() {
        let repo = InMemoryRepository::new();
        let user_id = UserId::new_random();
        let session = build_session(user_id, CourseId::new_random(), 0);
        repo.insert_session(&session).await.unwrap();

        repo.delete_sessions(&[session.id(), SessionId::new_random()])
            .await
            .unwrap();
        assert!(repo.list_sessions(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn preference_overwrites() {
        let repo = InMemoryRepository::new();
        repo.set_preference("selected_course", "a").await.unwrap();
        repo.set_preference("selected_course", "b").await.unwrap();
        assert_eq!(
            repo.get_preference("selected_course").await.unwrap(),
            Some("b".to_owned())
        );
        assert_eq!(repo.get_preference("missing").await.unwrap(), None);
    }
}
