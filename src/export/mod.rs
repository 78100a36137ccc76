//! Time-entry export (CSV / JSON).

mod fs_utils;
mod json_csv;
mod model;

pub use model::EntryExport;

use crate::errors::AppResult;
use crate::models::TimeEntry;
use crate::ui::messages::{success, warning};
use clap::ValueEnum;
use std::path::Path;

pub(crate) fn notify_export_success(label: &str, path: &Path) {
    success(format!("{label} export completed: {}", path.display()));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Write `entries` to `path`. An existing file is only replaced with
/// `force` or after confirmation.
pub fn export_entries(
    entries: &[TimeEntry],
    format: ExportFormat,
    path: &Path,
    force: bool,
) -> AppResult<usize> {
    fs_utils::ensure_writable(path, force)?;

    let rows: Vec<EntryExport> = entries.iter().map(EntryExport::from).collect();
    if rows.is_empty() {
        warning("No time entries match the filters; writing an empty export.");
    }

    match format {
        ExportFormat::Csv => json_csv::export_csv(&rows, path)?,
        ExportFormat::Json => json_csv::export_json(&rows, path)?,
    }
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entry() -> TimeEntry {
        serde_json::from_str(
            r#"{"id": 3, "employee": 1, "employee_name": "Pat Tester",
                "job_display_name": "WRP - Maple St",
                "start_time": "2025-03-01T09:00:00Z", "end_time": "2025-03-01T10:30:00Z",
                "duration_seconds": 5400.0,
                "activity_tags": [{"id": 1, "name": "Prep"}, {"id": 2, "name": "Cleanup"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn csv_has_header_and_flat_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.csv");

        let n = export_entries(&[entry()], ExportFormat::Csv, &path, false).unwrap();
        assert_eq!(n, 1);

        let out = fs::read_to_string(&path).unwrap();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("id,employee,job,"));
        let row = lines.next().unwrap();
        assert!(row.contains("WRP - Maple St"));
        assert!(row.contains("01:30:00"));
        assert!(row.contains("Prep;Cleanup"));
    }

    #[test]
    fn json_overwrites_with_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        fs::write(&path, "old").unwrap();

        export_entries(&[entry()], ExportFormat::Json, &path, true).unwrap();
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rows[0]["employee"], "Pat Tester");
        assert_eq!(rows[0]["duration_seconds"], 5400);
    }
}
