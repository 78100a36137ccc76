use crate::models::TimeEntry;
use crate::utils::time::format_hms;
use serde::Serialize;

/// Flat row for CSV / JSON export.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct EntryExport {
    pub id: i64,
    pub employee: String,
    pub job: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: i64,
    pub duration: String,
    pub description: String,
    pub is_interruption: bool,
    pub interruption_reason: String,
    pub tags: String,
}

impl From<&TimeEntry> for EntryExport {
    fn from(e: &TimeEntry) -> Self {
        let employee = e
            .employee_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| e.employee_id().map(|id| format!("#{id}")))
            .unwrap_or_default();
        let seconds = e.duration_seconds.max(0.0) as i64;

        Self {
            id: e.id,
            employee,
            job: e.job_display_name.clone(),
            start_time: e.start_time.to_rfc3339(),
            end_time: e.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
            duration_seconds: seconds,
            duration: format_hms(seconds),
            description: e.description.clone(),
            is_interruption: e.is_interruption,
            interruption_reason: e.interruption_reason.clone(),
            tags: e
                .activity_tags
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}
