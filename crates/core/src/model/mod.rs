mod course;
mod ids;
mod session;
mod user;

pub use course::{Course, CourseError};
pub use ids::{CourseId, ParseIdError, SessionId, UserId};
pub use session::{SessionError, StudySession};
pub use user::User;
