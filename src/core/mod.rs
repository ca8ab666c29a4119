pub mod orchestrator;
pub mod projection;
pub mod report;

pub use crate::domain::model::{CurriculumFile, RunReport, TaughtCoursesFile};
pub use crate::domain::ports::{ConfigProvider, CourseApi, Storage};
pub use crate::utils::error::Result;
