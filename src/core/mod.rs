//! State machines and client-side rules, independent of any rendering.

pub mod admin;
pub mod auth;
pub mod clock;
pub mod entries;
pub mod insights;
pub mod pending;
pub mod photos;
pub mod picker;
pub mod poll;
pub mod session;
pub mod tags;

pub use admin::AdminSession;
pub use clock::{ClockAction, ClockMachine, ClockState, StartOutcome};
pub use picker::{JobPicker, PickerState};
pub use session::{RoleRequest, SessionAction, SessionChange, SessionTracker};
pub use tags::{TagOverride, TagRequest};
