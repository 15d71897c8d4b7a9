#![forbid(unsafe_code)]

pub mod course_service;
pub mod demo;
pub mod error;
pub mod overview;
pub mod recorder;

pub use study_core::Clock;

pub use course_service::{CourseDraft, CourseService, parse_date_input};
pub use demo::{DemoSeed, seed_demo_data};
pub use error::{CourseServiceError, DemoSeedError, OverviewError, RecorderError};
pub use overview::{
    CourseAggregate, OverviewScreen, aggregate_by_course, format_date, format_minutes,
    format_time, overall_minutes,
};
pub use recorder::{
    CourseChange, RecorderState, SELECTED_COURSE_KEY, SessionRecorder, SwitchDecision,
    SwitchResolution,
};
