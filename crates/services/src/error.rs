//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use study_core::model::{CourseError, SessionError};

/// Errors emitted by `SessionRecorder`.
///
/// Store failures are surfaced to the caller at the point of the operation
/// and never retried automatically; the recorder stays usable afterwards.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecorderError {
    #[error("no course-switch confirmation is pending")]
    NotConfirming,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `OverviewScreen`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OverviewError {
    #[error("not signed in")]
    SignedOut,
    #[error("no sessions selected for deletion")]
    EmptySelection,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while seeding demo data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DemoSeedError {
    #[error(transparent)]
    Course(#[from] CourseServiceError),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error("not signed in")]
    SignedOut,
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
