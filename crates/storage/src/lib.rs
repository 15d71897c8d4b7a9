#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AuthProvider, CourseRepository, InMemoryRepository, PreferenceRepository, SessionRepository,
    Storage, StorageError,
};
