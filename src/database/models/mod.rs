pub mod activity;
pub mod announcement;
pub mod document;
pub mod employee;
pub mod schedule;
pub mod time_off;
pub mod user;

pub use activity::UserActivity;
pub use announcement::{Announcement, Priority};
pub use document::{Document, DocumentType};
pub use employee::{Employee, EmployeeStatus};
pub use schedule::{Schedule, ScheduleView};
pub use time_off::{TimeOffRequest, TimeOffStatus, TimeOffType};
pub use user::User;

use crate::filter::Column;

/// A table whose rows can be queried through the filter layer
pub trait Table {
    const NAME: &'static str;
    /// Columns callers may filter, sort and select on
    const COLUMNS: &'static [Column];
}
