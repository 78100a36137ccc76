//! Contracts with the time-clock backend.
//!
//! The state machines in `core` only talk to these traits; `http` provides
//! the real implementation and the tests plug in an in-memory backend.

pub mod admin;
pub mod http;

pub use admin::HttpAdminApi;
pub use http::HttpApi;

use crate::errors::AppResult;
use crate::models::insights::{Patterns, RoleHoursReport, TagDistribution};
use crate::models::{
    ActivityTag, AdminEmployee, Employee, JobCategory, NewEmployee, PhotoFile, TimeEntry,
    TimeEntryPhoto,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------
// Requests
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockStartRequest {
    pub employee_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_code_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterruptedStartRequest {
    pub employee_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_code_id: Option<i64>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeRequest {
    pub employee_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStartRequest {
    pub role_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_code_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activity_tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSwitchRequest {
    pub role_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_code_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionStopRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagUpdateRequest {
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyPinRequest {
    pub employee_id: i64,
    pub pin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetPinRequest {
    pub pin: String,
}

/// Admin edit of a time entry; unset fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.end_time.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryFilters {
    pub employee: Option<i64>,
    pub job_category: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl EntryFilters {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(e) = self.employee {
            q.push(("employee", e.to_string()));
        }
        if let Some(c) = self.job_category {
            q.push(("job_category", c.to_string()));
        }
        if let Some(d) = self.start_date {
            q.push(("start_date", d.to_string()));
        }
        if let Some(d) = self.end_date {
            q.push(("end_date", d.to_string()));
        }
        q
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightsFilters {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub role_id: Option<i64>,
}

impl InsightsFilters {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = vec![
            ("start_date", self.start_date.to_string()),
            ("end_date", self.end_date.to_string()),
        ];
        if let Some(r) = self.role_id {
            q.push(("role_id", r.to_string()));
        }
        q
    }
}

// ---------------------------
// Responses
// ---------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentEntryResponse {
    pub current_entry: Option<TimeEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActiveSessionResponse {
    pub active_session: Option<TimeEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptedStopResponse {
    pub closed_interruption: TimeEntry,
    pub resumed_entry: Option<TimeEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSwitchResponse {
    pub ended_sessions: Vec<TimeEntry>,
    pub new_session: TimeEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyPinResponse {
    pub valid: bool,
    #[serde(default)]
    pub employee: Option<Employee>,
    #[serde(default)]
    pub error: Option<String>,
}

/// List endpoints answer either with a paginated envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paginated { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Paginated { results } => results,
            ListResponse::Plain(items) => items,
        }
    }
}

// ---------------------------
// Traits
// ---------------------------

/// Employee, job, entry/session, tag and PIN endpoints used by the clock.
pub trait ClockApi {
    fn employees(&self) -> AppResult<Vec<Employee>>;
    fn job_categories(&self) -> AppResult<Vec<JobCategory>>;

    fn current_entry(&self, employee_id: i64) -> AppResult<Option<TimeEntry>>;
    fn clock_start(&self, req: &ClockStartRequest) -> AppResult<TimeEntry>;
    fn clock_stop(&self, employee_id: i64) -> AppResult<TimeEntry>;
    fn interrupted_start(&self, req: &InterruptedStartRequest) -> AppResult<TimeEntry>;
    fn interrupted_stop(&self, employee_id: i64) -> AppResult<InterruptedStopResponse>;

    fn active_session(&self) -> AppResult<Option<TimeEntry>>;
    fn session_start(&self, req: &SessionStartRequest) -> AppResult<TimeEntry>;
    fn session_stop(&self, req: &SessionStopRequest) -> AppResult<TimeEntry>;
    fn session_switch(&self, req: &SessionSwitchRequest) -> AppResult<SessionSwitchResponse>;

    fn activity_tags(&self) -> AppResult<Vec<ActivityTag>>;
    fn tags_for_role(&self, role_id: i64) -> AppResult<Vec<ActivityTag>>;
    fn update_session_tags(&self, session_id: i64, tag_ids: &[i64]) -> AppResult<TimeEntry>;

    fn verify_pin(&self, employee_id: i64, pin: &str) -> AppResult<VerifyPinResponse>;
}

pub trait PhotoApi {
    fn upload_photo(
        &self,
        entry_id: i64,
        photo: &PhotoFile,
        caption: Option<&str>,
    ) -> AppResult<TimeEntryPhoto>;
    fn delete_photo(&self, photo_id: i64) -> AppResult<()>;
}

/// Admin review of entries plus the insights aggregates.
pub trait ReportApi {
    fn time_entries(&self, filters: &EntryFilters) -> AppResult<Vec<TimeEntry>>;
    fn time_entry(&self, id: i64) -> AppResult<TimeEntry>;
    fn update_time_entry(&self, id: i64, update: &EntryUpdate) -> AppResult<TimeEntry>;
    fn delete_time_entry(&self, id: i64) -> AppResult<()>;

    fn role_hours(&self, filters: &InsightsFilters) -> AppResult<RoleHoursReport>;
    fn tag_distribution(&self, filters: &InsightsFilters) -> AppResult<TagDistribution>;
    fn patterns(&self, filters: &InsightsFilters) -> AppResult<Patterns>;
}

/// Bearer-token gated employee management.
pub trait AdminApi {
    fn list_employees(&self, token: &str) -> AppResult<Vec<AdminEmployee>>;
    fn add_employee(&self, token: &str, employee: &NewEmployee) -> AppResult<AdminEmployee>;
    fn set_pin(&self, token: &str, employee_id: i64, pin: &str) -> AppResult<()>;
    fn delete_employee(&self, token: &str, employee_id: i64) -> AppResult<()>;
}
