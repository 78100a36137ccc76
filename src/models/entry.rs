use crate::models::{ActivityTag, Employee, JobCategory, JobCode, TimeEntryPhoto};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// List endpoints return the employee id, detail endpoints the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeeRef {
    Id(i64),
    Detail(Box<Employee>),
}

impl EmployeeRef {
    pub fn id(&self) -> i64 {
        match self {
            EmployeeRef::Id(id) => *id,
            EmployeeRef::Detail(e) => e.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PausedEntry {
    pub id: i64,
    pub job_display_name: String,
    pub start_time: DateTime<Utc>,
}

/// A time entry. The role-based flow calls the same record a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    #[serde(default)]
    pub employee: Option<EmployeeRef>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub job_category: Option<i64>,
    #[serde(default)]
    pub job_code: Option<i64>,
    #[serde(default)]
    pub job_display_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub activity_tags: Vec<ActivityTag>,
    #[serde(default)]
    pub is_interruption: bool,
    #[serde(default)]
    pub interrupted_entry: Option<i64>,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub interruption_reason: String,
    #[serde(default)]
    pub job_category_detail: Option<JobCategory>,
    #[serde(default)]
    pub job_code_detail: Option<JobCode>,
    #[serde(default)]
    pub paused_entry: Option<PausedEntry>,
    #[serde(default)]
    pub photos: Vec<TimeEntryPhoto>,
}

pub type Session = TimeEntry;

impl TimeEntry {
    pub fn employee_id(&self) -> Option<i64> {
        self.employee.as_ref().map(EmployeeRef::id)
    }

    /// Tag ids in server order.
    pub fn tag_ids(&self) -> Vec<i64> {
        self.activity_tags.iter().map(|t| t.id).collect()
    }

    /// Seconds elapsed at `now`; closed entries use their end time.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let end = self.end_time.unwrap_or(now);
        (end - self.start_time).num_seconds().max(0)
    }

    /// Role label used by the session view: "Role - Code" or just "Role".
    pub fn role_label(&self) -> String {
        let role = self
            .job_category_detail
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Unknown Role".to_string());
        match &self.job_code_detail {
            Some(code) => format!("{role} - {}", code.name),
            None => role,
        }
    }
}
