//! Domain records exchanged with the time-clock backend.

pub mod employee;
pub mod entry;
pub mod insights;
pub mod job;
pub mod photo;
pub mod tag;

pub use employee::{AdminEmployee, Employee, NewEmployee};
pub use entry::{EmployeeRef, PausedEntry, Session, TimeEntry};
pub use job::{JobCategory, JobCode, JobSelection, Role};
pub use photo::{PhotoFile, TimeEntryPhoto};
pub use tag::ActivityTag;
