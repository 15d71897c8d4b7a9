//! Time-use overview: per-course aggregation of study sessions, the
//! edit/delete selection flow, and the shared duration formatting.

mod aggregate;
mod screen;
mod view;

pub use aggregate::{CourseAggregate, aggregate_by_course, overall_minutes};
pub use screen::OverviewScreen;
pub use view::{format_date, format_minutes, format_time};
