//! Admin review of time entries: filters, edits and totals.

use crate::api::{EntryFilters, EntryUpdate};
use crate::errors::{AppError, AppResult};
use crate::models::TimeEntry;
use crate::utils::date::parse_date;
use crate::utils::time::parse_datetime;
use chrono::{DateTime, Utc};

pub fn parse_filters(
    employee: Option<i64>,
    category: Option<i64>,
    from: Option<&str>,
    to: Option<&str>,
) -> AppResult<EntryFilters> {
    let date = |s: &str| {
        parse_date(s).ok_or_else(|| AppError::Validation(format!("Invalid date '{s}' (expected YYYY-MM-DD)")))
    };
    let filters = EntryFilters {
        employee,
        job_category: category,
        start_date: from.map(date).transpose()?,
        end_date: to.map(date).transpose()?,
    };
    if let (Some(s), Some(e)) = (filters.start_date, filters.end_date)
        && s > e
    {
        return Err(AppError::Validation(format!(
            "Start date {s} is after end date {e}"
        )));
    }
    Ok(filters)
}

fn datetime(s: &str) -> AppResult<DateTime<Utc>> {
    parse_datetime(s).ok_or_else(|| {
        AppError::Validation(format!(
            "Invalid date/time '{s}' (expected YYYY-MM-DD HH:MM)"
        ))
    })
}

/// Build a partial update. Missing bounds are taken from `current` when
/// checking that the entry still ends after it starts.
pub fn build_update(
    current: Option<&TimeEntry>,
    start: Option<&str>,
    end: Option<&str>,
    description: Option<&str>,
) -> AppResult<EntryUpdate> {
    let update = EntryUpdate {
        start_time: start.map(datetime).transpose()?,
        end_time: end.map(datetime).transpose()?,
        description: description.map(|d| d.trim().to_string()),
    };
    if update.is_empty() {
        return Err(AppError::Validation("Nothing to update".into()));
    }

    let start = update.start_time.or(current.map(|c| c.start_time));
    let end = update.end_time.or(current.and_then(|c| c.end_time));
    if let (Some(s), Some(e)) = (start, end)
        && e <= s
    {
        return Err(AppError::Validation(
            "End time must be after start time".into(),
        ));
    }
    Ok(update)
}

/// Total recorded seconds across `entries`.
pub fn total_seconds(entries: &[TimeEntry]) -> f64 {
    entries.iter().map(|e| e.duration_seconds.max(0.0)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: &str, end: Option<&str>, secs: f64) -> TimeEntry {
        let end = end.map(|e| format!(r#""{e}""#)).unwrap_or("null".into());
        serde_json::from_str(&format!(
            r#"{{"id": 1, "start_time": "{start}", "end_time": {end}, "duration_seconds": {secs}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(build_update(None, None, None, None).is_err());
    }

    #[test]
    fn end_must_follow_start_including_existing_bounds() {
        let e = entry("2025-03-01T09:00:00Z", Some("2025-03-01T17:00:00Z"), 0.0);
        assert!(build_update(Some(&e), None, Some("2025-03-01T08:00:00Z"), None).is_err());
        assert!(build_update(Some(&e), Some("2025-03-01T18:00:00Z"), None, None).is_err());

        let u = build_update(Some(&e), None, Some("2025-03-01T18:00:00Z"), Some(" fixed ")).unwrap();
        assert_eq!(u.description.as_deref(), Some("fixed"));
        assert!(u.start_time.is_none());
    }

    #[test]
    fn invalid_dates_are_validation_errors() {
        assert!(build_update(None, Some("soon"), None, None).unwrap_err().is_validation());
        assert!(parse_filters(None, None, Some("2025-13-01"), None).is_err());
        assert!(parse_filters(None, None, Some("2025-03-02"), Some("2025-03-01")).is_err());
    }

    #[test]
    fn totals_ignore_negative_durations() {
        let list = vec![
            entry("2025-03-01T09:00:00Z", None, 60.0),
            entry("2025-03-01T09:00:00Z", None, -5.0),
        ];
        assert_eq!(total_seconds(&list), 60.0);
    }
}
