//! Time utilities: injectable "now", timer formatting, datetime parsing.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::cell::Cell;

/// Source of the current instant; the state machines never call `Utc::now()`
/// directly so tests can move time forward.
pub trait TimeSource {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct ManualClock {
    millis: Cell<i64>,
}

impl ManualClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            millis: Cell::new(instant.timestamp_millis()),
        }
    }

    pub fn advance_millis(&self, ms: i64) {
        self.millis.set(self.millis.get() + ms);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.get()).unwrap_or_default()
    }

    fn now_millis(&self) -> i64 {
        self.millis.get()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Clock-view timer: `H:MM:SS` past the hour, `M:SS` below it.
pub fn format_timer(seconds: i64) -> String {
    let s = seconds.max(0);
    let hours = s / 3600;
    let minutes = (s % 3600) / 60;
    let secs = s % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Session-view timer, always `HH:MM:SS`.
pub fn format_hms(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

/// Admin listing: `1h 2m 3s` or `2m 3s`.
pub fn format_duration_long(seconds: f64) -> String {
    let s = seconds.max(0.0) as i64;
    let hours = s / 3600;
    let minutes = (s % 3600) / 60;
    let secs = s % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}

/// Parse `YYYY-MM-DD HH:MM` (local time) or RFC 3339.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_formats() {
        assert_eq!(format_timer(59), "0:59");
        assert_eq!(format_timer(3600), "1:00:00");
        assert_eq!(format_timer(3725), "1:02:05");
        assert_eq!(format_hms(3725), "01:02:05");
        assert_eq!(format_duration_long(125.9), "2m 5s");
        assert_eq!(format_duration_long(3725.0), "1h 2m 5s");
    }

    #[test]
    fn parses_rfc3339_and_local_forms() {
        let dt = parse_datetime("2025-03-01T09:00:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-03-01T09:00:00+00:00");
        assert!(parse_datetime("2025-03-01 09:00").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at(DateTime::from_timestamp_millis(1_000).unwrap());
        clock.advance_millis(500);
        assert_eq!(clock.now_millis(), 1_500);
    }
}
